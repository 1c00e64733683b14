fn main() -> std::process::ExitCode {
    reviewer_assign_lib::run()
}

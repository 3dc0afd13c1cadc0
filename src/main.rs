fn main() {
    if let Err(err) = concept_mentor::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}

fn main() {
    if let Err(err) = simbeat_lib::run() {
        eprintln!("simbeat: {err:#}");
        std::process::exit(1);
    }
}

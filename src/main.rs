fn main() {
    if let Err(err) = schematic_router::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

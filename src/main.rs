fn main() {
    if let Err(e) = screenline_lib::run() {
        eprintln!("screenline: {e}");
        std::process::exit(1);
    }
}

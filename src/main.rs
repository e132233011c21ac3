fn main() {
    if let Err(err) = tabrecon::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

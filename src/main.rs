fn main() {
    if let Err(err) = rowbind::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

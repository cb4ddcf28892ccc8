fn main() {
    if let Err(err) = anime_stats::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

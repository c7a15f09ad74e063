fn main() {
    fmtequiv::cli::run();
}

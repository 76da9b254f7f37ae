fn main() {
    halcyon::logging::init();
    halcyon::init_all();
    halcyon::uci::run();
}

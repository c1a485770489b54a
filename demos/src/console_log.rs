use log::LevelFilter;
use roto_log::Config;

fn main() {
    roto_log::init(Config::new().level(LevelFilter::Debug).console()).unwrap();
    log::info!("Commencing yak shaving");
    log::debug!("the shaver is {}", "electric");
    roto_log::exit();
}

use roto_log::plugin::file_rotate::RotateConfig;
use roto_log::Config;

fn main() {
    std::fs::create_dir_all("target/logs").unwrap();
    roto_log::init(
        Config::new().file_rotate(RotateConfig::new("target/logs/wait.log")),
    )
    .unwrap();
    for n in 0..10000 {
        log::info!("index: {}", n);
    }
    let now = std::time::Instant::now();
    // barrier: every queued record is on disk once this returns
    roto_log::flush().wait();
    println!("flush waited: {:?}", now.elapsed());
    roto_log::exit();
}

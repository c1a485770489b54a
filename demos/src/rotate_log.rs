use roto_log::plugin::file_rotate::RotateConfig;
use roto_log::Config;

fn main() {
    std::fs::create_dir_all("target/logs").unwrap();
    roto_log::init(
        Config::new().file_rotate(
            RotateConfig::new("target/logs/rotate.log")
                .max_lines(1000)
                .max_files(5)
                .head_foot("-- opened %D %T --\n", "-- closed %D %T --\n"),
        ),
    )
    .unwrap();
    for n in 0..5000 {
        log::info!("Commencing yak shaving {}", n);
    }
    roto_log::exit();
    println!("you can see rotated files next to: {}", "target/logs/rotate.log");
}

use roto_log::Config;

/// Pair with e.g. `nc -l 5140` to watch the JSON records arrive.
fn main() {
    roto_log::init(Config::new().console().socket("127.0.0.1:5140")).unwrap();
    for n in 0..10 {
        log::info!("over the wire {}", n);
    }
    roto_log::exit();
}

pub type TcpStream = std::net::TcpStream;
pub type Receiver<T> = crossbeam_channel::Receiver<T>;
pub type Sender<T> = crossbeam_channel::Sender<T>;
pub type JoinHandle<T> = std::thread::JoinHandle<T>;
pub type WaitGroup = crossbeam_utils::sync::WaitGroup;

/// Bounded channel. A len of 0 gives a rendezvous channel: send blocks until
/// the receiver takes the message.
pub fn chan<T>(len: usize) -> (Sender<T>, Receiver<T>) {
    crossbeam_channel::bounded(len)
}

pub fn spawn<F>(f: F) -> JoinHandle<()>
where
    F: FnOnce() + Send + 'static,
{
    std::thread::spawn(f)
}

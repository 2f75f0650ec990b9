use crate::network::{Loopback, StepClock};
use criterion::{BatchSize, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use wirestream::network::application::http;
use wirestream::network::application::websocket::{Client, Opcode};

const MESSAGE_LEN: usize = 1024;
const UPGRADE_RESPONSE: &[u8] = b"HTTP/1.1 101 Switching Protocols\r\n\r\n";

type BenchClient = Client<Loopback, StepClock, Box<dyn FnMut() -> u8>, MESSAGE_LEN>;

fn upgraded_client() -> BenchClient {
    let mut rng = StdRng::seed_from_u64(7);
    let random: Box<dyn FnMut() -> u8> = Box::new(move || rng.r#gen::<u8>());
    let http = http::Client::new(
        Loopback::with_incoming(UPGRADE_RESPONSE),
        StepClock::default(),
    );
    let mut ws = Client::from_http(http, random);
    ws.begin("/bench").expect("Handshake failed");
    ws.http_mut().connection_mut().outgoing.clear();
    ws
}

fn payload() -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(99);
    (0..MESSAGE_LEN).map(|_| rng.r#gen::<u8>()).collect()
}

pub fn bench_send_message(c: &mut Criterion) {
    let mut group = c.benchmark_group("send_message");
    let payload = payload();
    group.throughput(Throughput::Bytes(MESSAGE_LEN as u64));
    group.bench_function("send_message", |b| {
        b.iter_batched_ref(
            upgraded_client,
            |ws| {
                ws.begin_message(Opcode::Binary).expect("Failed to begin");
                ws.write(&payload).expect("Failed to write");
                ws.end_message().expect("Failed to send");
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

pub fn bench_receive_message(c: &mut Criterion) {
    let mut group = c.benchmark_group("receive_message");
    let payload = payload();

    let mut sender = upgraded_client();
    sender.begin_message(Opcode::Binary).expect("Failed to begin");
    sender.write(&payload).expect("Failed to write");
    sender.end_message().expect("Failed to send");
    let frame = sender.http_mut().connection_mut().outgoing.clone();

    group.throughput(Throughput::Bytes(MESSAGE_LEN as u64));
    group.bench_function("receive_message", |b| {
        b.iter_batched_ref(
            || {
                let mut ws = upgraded_client();
                ws.http_mut().connection_mut().incoming.extend(frame.iter().copied());
                ws
            },
            |ws| {
                assert_eq!(ws.parse_message().expect("No frame"), MESSAGE_LEN as u64);
                let mut buf = [0u8; MESSAGE_LEN];
                assert_eq!(ws.read(&mut buf).expect("Failed to read"), MESSAGE_LEN);
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

//! Hot-path benchmarks for the column FEC engine.
//!
//! - FEC header decode
//! - Ring admission + eviction
//! - Single-packet XOR recovery for MPEG-TS sized payloads
//!
//! Run with: cargo bench --package ipfec

use bytes::{Bytes, BytesMut};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use ipfec::config::FecMatrixConfig;
use ipfec::header::TS_PACKET_SIZE;
use ipfec::ring::FecRing;
use ipfec::{
    ColumnEncoder, FecConfig, FecHeader, FecSession, MediaPacket, MediaWindow, RtpHeader, Seq16,
};

fn fec_payload(sn_base: u16) -> Bytes {
    let mut buf = BytesMut::new();
    FecHeader::column(Seq16::new(sn_base), 1316, 10, 10).encode(&mut buf);
    buf.extend_from_slice(&[0x5A; 7 * TS_PACKET_SIZE]);
    buf.freeze()
}

// ─── Header ──────────────────────────────────────────────────────────────

fn bench_header_decode(c: &mut Criterion) {
    let payload = fec_payload(1234);
    c.bench_function("fec_header_decode", |b| {
        b.iter(|| black_box(FecHeader::decode(black_box(&payload))));
    });
}

// ─── Ring ────────────────────────────────────────────────────────────────

fn bench_ring_admit_evict(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring");
    group.throughput(Throughput::Elements(64));
    let payloads: Vec<Bytes> = (0..64u16).map(|i| fec_payload(i * 10)).collect();

    group.bench_function("admit_evict_64", |b| {
        let mut ring = FecRing::new(64);
        let mut matrix = FecMatrixConfig::default();
        b.iter(|| {
            for p in &payloads {
                black_box(ring.admit(p.clone(), &mut matrix));
            }
            black_box(ring.evict_up_to(Seq16::new(10_000), matrix.matrix_size()));
        });
    });
    group.finish();
}

// ─── Recovery ────────────────────────────────────────────────────────────

fn bench_recover_lost(c: &mut Criterion) {
    let session = FecSession::new(FecConfig::default()).unwrap();
    session.start().unwrap();
    let mut encoder = ColumnEncoder::new(10, 10).unwrap();
    let mut window = MediaWindow::new(200);

    for n in 0..100u16 {
        let seq = Seq16::new(n);
        let payload = vec![n as u8; 7 * TS_PACKET_SIZE];
        for fec in encoder.add_media(seq, &payload) {
            session.enqueue(&RtpHeader::new(96, Seq16::new(n), 0, 1), fec);
        }
        let mut framed = BytesMut::new();
        RtpHeader::new(33, seq, 0, 2).encode(&mut framed);
        framed.extend_from_slice(&payload);
        window.place(MediaPacket::new(seq, framed.freeze()));
    }
    let lost = window.slot_for(Seq16::new(55));
    window.take(lost);

    let mut group = c.benchmark_group("recovery");
    group.throughput(Throughput::Bytes((7 * TS_PACKET_SIZE) as u64));
    group.bench_function("recover_1316B_10x10", |b| {
        b.iter(|| black_box(session.recover_lost(&window, black_box(lost))));
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_header_decode,
    bench_ring_admit_evict,
    bench_recover_lost,
);
criterion_main!(benches);

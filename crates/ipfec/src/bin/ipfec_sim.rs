//! # ipfec-sim
//!
//! Synthetic end-to-end run of the column FEC engine. A producer thread
//! generates an MPEG-TS-over-RTP stream with column FEC, drops media packets
//! at random, and hands everything to a receiver loop over a channel. The
//! receiver rebuilds the holes and prints the session statistics as JSON.
//!
//! ## Usage
//!
//! ```bash
//! # 20 000 packets, 2% loss, default 10x10 matrix
//! ipfec-sim --packets 20000 --loss 0.02
//!
//! # Geometry and ring size from a TOML file
//! ipfec-sim --config fec.toml --seed 7
//! ```

use std::collections::VecDeque;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use crossbeam_channel::{bounded, Receiver, Sender};
use rand::rngs::StdRng;
use rand::RngExt as _;
use rand::SeedableRng;
use serde::Serialize;

use ipfec::header::TS_PACKET_SIZE;
use ipfec::{
    ColumnEncoder, Disposition, FecConfig, FecSession, MediaPacket, MediaWindow, RtpHeader, Seq16,
    SessionStats,
};

/// TS packets carried by one media datagram.
const TS_PER_DATAGRAM: usize = 7;
const MEDIA_PT: u8 = 33;
const FEC_PT: u8 = 96;

enum Event {
    Media(Bytes),
    /// A dropped media packet, with its protected payload for verification.
    Lost { seq: Seq16, payload: Bytes },
    Fec(Bytes),
}

#[derive(Debug, Default, Serialize)]
struct Report {
    media_packets: u64,
    dropped: u64,
    recovered: u64,
    mismatched: u64,
    fec_packets: u64,
    recovery_ratio: f64,
    stats: SessionStats,
}

fn main() -> anyhow::Result<()> {
    // ── Logging ─────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(true)
        .compact()
        .init();

    // ── Parse CLI ───────────────────────────────────────────────
    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => FecConfig::from_toml_str(&std::fs::read_to_string(path)?)?,
        None => FecConfig::default(),
    };
    let columns = u8::try_from(config.matrix.column_count())?;
    let rows = u8::try_from(config.matrix.row_count())?;

    tracing::info!(
        packets = args.packets,
        loss = args.loss,
        seed = args.seed,
        columns,
        rows,
        "ipfec-sim starting"
    );

    // ── Session ─────────────────────────────────────────────────
    let matrix_size = config.matrix.matrix_size() as usize;
    let session = Arc::new(FecSession::new(config)?);
    session.start()?;

    // ── Producer ────────────────────────────────────────────────
    let (tx, rx) = bounded::<Event>(1024);
    let producer = {
        let args = args.clone();
        std::thread::Builder::new()
            .name("producer".into())
            .spawn(move || produce(&args, columns, rows, tx))?
    };

    // ── Receiver loop ───────────────────────────────────────────
    let mut report = receive(&session, rx, matrix_size);
    producer
        .join()
        .map_err(|_| anyhow::anyhow!("producer thread panicked"))??;

    report.stats = session.get_stats();
    report.recovery_ratio = report.stats.recovery_ratio();
    let outcome = session.stop();
    tracing::info!(?outcome, "session stopped");
    session.term();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn produce(args: &Args, columns: u8, rows: u8, tx: Sender<Event>) -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut encoder = ColumnEncoder::new(columns, rows)?;
    let ssrc: u32 = rng.random();
    let mut media_seq = Seq16::new(rng.random());
    let mut fec_seq = Seq16::new(rng.random());

    for n in 0..args.packets {
        let timestamp = (n as u32).wrapping_mul(3003);
        let mut payload = vec![0u8; TS_PER_DATAGRAM * TS_PACKET_SIZE];
        for ts in payload.chunks_mut(TS_PACKET_SIZE) {
            for byte in ts.iter_mut() {
                *byte = rng.random();
            }
            ts[0] = 0x47;
        }

        for fec in encoder.add_media(media_seq, &payload) {
            let mut buf = BytesMut::with_capacity(12 + fec.len());
            RtpHeader::new(FEC_PT, fec_seq, timestamp, ssrc ^ 1).encode(&mut buf);
            buf.extend_from_slice(&fec);
            fec_seq = fec_seq.next();
            send(&tx, Event::Fec(buf.freeze()))?;
        }

        let event = if rng.random::<f64>() < args.loss {
            Event::Lost {
                seq: media_seq,
                payload: Bytes::from(payload),
            }
        } else {
            let mut buf = BytesMut::with_capacity(12 + payload.len());
            RtpHeader::new(MEDIA_PT, media_seq, timestamp, ssrc).encode(&mut buf);
            buf.extend_from_slice(&payload);
            Event::Media(buf.freeze())
        };
        send(&tx, event)?;
        media_seq = media_seq.next();
    }
    Ok(())
}

fn send(tx: &Sender<Event>, event: Event) -> anyhow::Result<()> {
    tx.send(event).map_err(|_| anyhow::anyhow!("receiver hung up"))
}

fn receive(session: &FecSession, rx: Receiver<Event>, matrix_size: usize) -> Report {
    let mut report = Report::default();
    let mut window = MediaWindow::new(4 * matrix_size.max(1));
    // Holes waiting for their column's FEC packet: (seq, original payload).
    let mut holes: VecDeque<(Seq16, Bytes)> = VecDeque::new();
    let mut newest: Option<Seq16> = None;

    for event in rx {
        match event {
            Event::Fec(packet) => {
                report.fec_packets += 1;
                let Some(hdr) = RtpHeader::decode(&packet) else {
                    tracing::warn!(len = packet.len(), "undecodable FEC datagram");
                    continue;
                };
                match session.enqueue(&hdr, packet.slice(hdr.header_len..)) {
                    Disposition::Consumed | Disposition::PassThrough => {}
                    other => tracing::debug!(?other, "FEC packet not queued"),
                }
            }
            Event::Media(packet) => {
                let Some(hdr) = RtpHeader::decode(&packet) else {
                    continue;
                };
                report.media_packets += 1;
                window.place(MediaPacket::new(hdr.sequence, packet));
                newest = Some(hdr.sequence);
                session.release_media(hdr.sequence);
            }
            Event::Lost { seq, payload } => {
                report.media_packets += 1;
                report.dropped += 1;
                // Clear whatever an earlier lap of the window left behind.
                let idx = window.slot_for(seq);
                window.take(idx);
                holes.push_back((seq, payload));
            }
        }

        // A column's FEC follows its last member, at most one matrix later.
        loop {
            let ready = match (holes.front(), newest) {
                (Some((seq, _)), Some(newest)) => newest.diff(*seq) >= matrix_size as i32,
                _ => false,
            };
            if !ready {
                break;
            }
            if let Some((seq, original)) = holes.pop_front() {
                repair(session, &mut window, &mut report, seq, original);
            }
        }
    }

    while let Some((seq, original)) = holes.pop_front() {
        repair(session, &mut window, &mut report, seq, original);
    }
    report
}

fn repair(
    session: &FecSession,
    window: &mut MediaWindow,
    report: &mut Report,
    seq: Seq16,
    original: Bytes,
) {
    let idx = window.slot_for(seq);
    match session.recover_lost(window, idx) {
        Ok(packet) => {
            report.recovered += 1;
            if packet.seq != seq || packet.payload != original {
                report.mismatched += 1;
                tracing::warn!(%seq, recovered = %packet.seq, "recovered payload mismatch");
            }
            window.insert_recovered(idx, packet.seq, packet.payload);
        }
        Err(e) => tracing::debug!(%seq, error = %e, "media packet unrecoverable"),
    }
}

// ─── CLI Parsing ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Args {
    config: Option<String>,
    packets: u64,
    loss: f64,
    seed: u64,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = std::env::args().collect();
    let mut config = None;
    let mut packets = 10_000u64;
    let mut loss = 0.01f64;
    let mut seed = 42u64;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                config = Some(
                    args.get(i)
                        .ok_or_else(|| anyhow::anyhow!("--config requires a value"))?
                        .clone(),
                );
            }
            "--packets" | "-n" => {
                i += 1;
                let val = args
                    .get(i)
                    .ok_or_else(|| anyhow::anyhow!("--packets requires a value"))?;
                packets = val
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid packet count '{}': {}", val, e))?;
            }
            "--loss" | "-l" => {
                i += 1;
                let val = args
                    .get(i)
                    .ok_or_else(|| anyhow::anyhow!("--loss requires a value"))?;
                loss = val
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid loss rate '{}': {}", val, e))?;
                if !(0.0..=1.0).contains(&loss) {
                    anyhow::bail!("loss rate must be within 0..=1, got {loss}");
                }
            }
            "--seed" | "-s" => {
                i += 1;
                let val = args
                    .get(i)
                    .ok_or_else(|| anyhow::anyhow!("--seed requires a value"))?;
                seed = val
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid seed '{}': {}", val, e))?;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            other => {
                anyhow::bail!("unknown argument: {other}\nRun with --help for usage.");
            }
        }
        i += 1;
    }

    Ok(Args {
        config,
        packets,
        loss,
        seed,
    })
}

fn print_help() {
    println!(
        "ipfec-sim: column FEC recovery simulation

USAGE:
    ipfec-sim [OPTIONS]

OPTIONS:
    -c, --config <PATH>    TOML engine configuration
    -n, --packets <N>      Media packets to generate (default 10000)
    -l, --loss <P>         Media loss probability, 0..=1 (default 0.01)
    -s, --seed <S>         RNG seed (default 42)
    -h, --help             Print this help

ENVIRONMENT:
    RUST_LOG               Log filter (default: info)"
    );
}

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const CYCLE: u32 = 1;
const WORDS_PER_LINE: usize = 4;
const FDF_48K: u8 = 0x02;
const SYT_STEP: u16 = 0x0200;
const SAMPLES_PER_PACKET: usize = 2;
const AM824_LABEL: u32 = 0x4000_0000;
const AM824_SAMPLE_MASK: u32 = 0x00FF_FFFF;

fn main() -> Result<(), String> {
    let root = PathBuf::from("tests/golden");
    write_continuity_fixtures(&root)?;
    write_packet_fixtures(&root)?;
    Ok(())
}

fn write_continuity_fixtures(root: &Path) -> Result<(), String> {
    write_log(
        root.join("dbc_clean").join("input.log"),
        LogPlan::single_channel(&[
            Kind::Data(0x00),
            Kind::Data(0x08),
            Kind::NoData(0x10),
            Kind::Data(0x10),
            Kind::Data(0x18),
            Kind::NoData(0x20),
            Kind::Data(0x20),
            Kind::Data(0x28),
        ]),
    )?;
    write_log(
        root.join("dbc_gap").join("input.log"),
        LogPlan::single_channel(&[
            Kind::Data(0x00),
            Kind::Data(0x08),
            Kind::Data(0x18),
            Kind::Data(0x20),
            Kind::NoData(0x30),
            Kind::Data(0x30),
            Kind::Data(0x38),
        ]),
    )?;
    write_log(
        root.join("multi_channel").join("input.log"),
        LogPlan {
            packets: [
                (0, 0x00),
                (1, 0x40),
                (0, 0x08),
                (1, 0x48),
                (0, 0x10),
                (1, 0x58),
                (0, 0x18),
                (1, 0x60),
            ]
            .into_iter()
            .map(|(channel, dbc)| PacketPlan::new(channel, Kind::Data(dbc)))
            .collect(),
        },
    )?;
    Ok(())
}

fn write_packet_fixtures(root: &Path) -> Result<(), String> {
    let mut mix = LogPlan::single_channel(&[
        Kind::NoData(0xF8),
        Kind::Data(0x00),
        Kind::NoData(0x08),
        Kind::Data(0x08),
        Kind::NoData(0x10),
        Kind::Data(0x10),
        Kind::Truncated(0xAA),
    ]);
    mix.packets[2].fdf = 0x07;
    mix.packets[4].fdf = 0xFF;
    mix.packets[4].syt = Some(0x1234);
    write_log(root.join("no_data_mix").join("input.log"), mix)?;

    let mut lengths = LogPlan::single_channel(&[
        Kind::Data(0x00),
        Kind::Data(0x08),
        Kind::Data(0x10),
        Kind::Data(0x18),
        Kind::Data(0x20),
    ]);
    lengths.packets[1].sizes = Some((24, 16));
    lengths.packets[2].length_error = Some(12);
    lengths.packets[3].sizes = Some((16, 200));
    lengths.packets[4].sizes = Some((64, 16));
    write_log(root.join("length_error").join("input.log"), lengths)?;

    let mut dropouts = LogPlan::single_channel(&[
        Kind::Data(0x00),
        Kind::Data(0x08),
        Kind::Data(0x10),
        Kind::Data(0x18),
        Kind::Data(0x20),
        Kind::Data(0x28),
    ]);
    dropouts.packets[1].samples = Some(vec![0, 0]);
    dropouts.packets[2].samples = Some(vec![0, 0]);
    dropouts.packets[4].samples = Some(vec![1, 2]);
    write_log(root.join("dropouts").join("input.log"), dropouts)?;
    Ok(())
}

#[derive(Clone, Copy)]
enum Kind {
    Data(u8),
    NoData(u8),
    /// Header word only; decodes as an invalid packet.
    Truncated(u8),
}

struct PacketPlan {
    channel: u32,
    kind: Kind,
    fdf: u8,
    syt: Option<u16>,
    samples: Option<Vec<u32>>,
    /// Declared and actual size overriding the word count.
    sizes: Option<(u32, u32)>,
    length_error: Option<u32>,
}

impl PacketPlan {
    fn new(channel: u32, kind: Kind) -> Self {
        Self {
            channel,
            kind,
            fdf: FDF_48K,
            syt: None,
            samples: None,
            sizes: None,
            length_error: None,
        }
    }
}

struct LogPlan {
    packets: Vec<PacketPlan>,
}

impl LogPlan {
    fn single_channel(kinds: &[Kind]) -> Self {
        Self {
            packets: kinds.iter().map(|&kind| PacketPlan::new(0, kind)).collect(),
        }
    }
}

fn ramp_sample(index: usize) -> u32 {
    (((index * 37) % 200 + 50) * 0x1000) as u32
}

fn packet_words(plan: &PacketPlan, index: usize, sample_base: &mut usize) -> Vec<u32> {
    let word1 = |dbc: u8| 0x0002_0000 | u32::from(dbc);
    let word2 = |syt: u16| 0x9000_0000 | (u32::from(plan.fdf) << 16) | u32::from(syt);
    match plan.kind {
        Kind::Truncated(dbc) => vec![word1(dbc)],
        Kind::NoData(dbc) => vec![word1(dbc), word2(plan.syt.unwrap_or(0xFFFF))],
        Kind::Data(dbc) => {
            let syt = plan.syt.unwrap_or((index as u16).wrapping_mul(SYT_STEP));
            let mut words = vec![word1(dbc), word2(syt)];
            match &plan.samples {
                Some(samples) => {
                    words.extend(samples.iter().map(|s| AM824_LABEL | (s & AM824_SAMPLE_MASK)))
                }
                None => {
                    for _ in 0..SAMPLES_PER_PACKET {
                        words.push(AM824_LABEL | ramp_sample(*sample_base));
                        *sample_base += 1;
                    }
                }
            }
            words
        }
    }
}

fn render(plan: &LogPlan) -> String {
    let mut out = String::from("Apple FireBug 2.3 05.04.01\n\n");
    let mut sample_base = 0;
    for (index, packet) in plan.packets.iter().enumerate() {
        let words = packet_words(packet, index, &mut sample_base);
        let natural = (words.len() * 4) as u32;
        let (declared, actual) = packet.sizes.unwrap_or((natural, natural));
        let _ = writeln!(
            out,
            "{CYCLE:03}:0000:{index:04}  Isoch channel {}, tag 1, sy 0, size {declared} [actual {actual}] s400",
            packet.channel
        );
        if let Some(bytes) = packet.length_error {
            let _ = writeln!(out, "               LENGTH ERROR - Snooped {bytes} bytes");
        }
        for (line, chunk) in words.chunks(WORDS_PER_LINE).enumerate() {
            let hex: Vec<String> = chunk.iter().map(|w| format!("{w:08x}")).collect();
            let _ = writeln!(
                out,
                "               {:04x}   {}",
                line * WORDS_PER_LINE * 4,
                hex.join(" ")
            );
        }
    }
    out
}

fn write_log(path: PathBuf, plan: LogPlan) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {}", parent.display(), err))?;
    }
    fs::write(&path, render(&plan))
        .map_err(|err| format!("failed to write {}: {}", path.display(), err))
}

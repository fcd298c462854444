use std::collections::HashMap;

use tracing::{info, warn};

use super::continuity::{DbcContinuity, annotate_continuity};
use crate::Outcome;
use crate::protocols::cip::{Packet, StreamFormat, decode_record};
use crate::source::firebug::tokenize_log;
use crate::source::{LogRecord, RecordSource, SourceError};

/// Sample rate assumed when the stream format is unknown.
pub const FALLBACK_SAMPLE_RATE: u32 = 44_100;
/// SYT_INTERVAL assumed when the stream format is unknown.
pub const FALLBACK_SYT_INTERVAL: u32 = 8;

/// A decoded capture: the single owner of the packet sequence.
///
/// Packets are decoded, the stream format is detected and the continuity
/// annotations are attached when the capture is built; afterwards every view
/// is read-only.
///
/// # Examples
/// ```
/// use fireshark_core::Capture;
///
/// let capture = Capture::from_log_text(
///     "Isoch channel 0, tag 1, sy 0, size 16\n 000200c8 900108a7 40000001 40000002\n",
/// );
/// assert_eq!(capture.sample_rate(), 44_100);
/// assert_eq!(capture.aggregated_samples(None).len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Capture {
    packets: Vec<Packet>,
    format: Outcome<StreamFormat>,
    sample_rate: u32,
    syt_interval: u32,
    continuity: DbcContinuity,
}

impl Capture {
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = LogRecord>,
    {
        let mut packets: Vec<Packet> = records.into_iter().map(|r| decode_record(&r)).collect();
        let format = detect_format(&packets);
        let (sample_rate, syt_interval) = match format.available() {
            Some(StreamFormat {
                sample_rate: Some(rate),
                syt_interval: Some(interval),
                ..
            }) => (*rate, *interval),
            _ => {
                warn!(
                    sample_rate = FALLBACK_SAMPLE_RATE,
                    syt_interval = FALLBACK_SYT_INTERVAL,
                    "stream format unknown, using defaults"
                );
                (FALLBACK_SAMPLE_RATE, FALLBACK_SYT_INTERVAL)
            }
        };
        let continuity = annotate_continuity(&mut packets, syt_interval);
        info!(
            packets = packets.len(),
            sample_rate,
            syt_interval,
            discontinuities = continuity.discontinuities.len(),
            "decoded capture"
        );
        Self {
            packets,
            format,
            sample_rate,
            syt_interval,
            continuity,
        }
    }

    pub fn from_source<S: RecordSource>(source: &mut S) -> Result<Self, SourceError> {
        let mut records = Vec::new();
        while let Some(record) = source.next_record()? {
            records.push(record);
        }
        Ok(Self::from_records(records))
    }

    /// Decode in-memory log text; tokenizing cannot fail.
    pub fn from_log_text(text: &str) -> Self {
        Self::from_records(tokenize_log(text))
    }

    /// Every decoded packet, invalid ones included, in stream order.
    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn format(&self) -> &Outcome<StreamFormat> {
        &self.format
    }

    /// Nominal sample rate, or the fallback when the format is unknown.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn syt_interval(&self) -> u32 {
        self.syt_interval
    }

    pub fn continuity(&self) -> &DbcContinuity {
        &self.continuity
    }

    /// Channels of valid packets in first-seen order.
    pub fn channels(&self) -> Vec<u32> {
        self.continuity.channels.clone()
    }

    /// Valid data packets in stream order, optionally restricted to one channel.
    pub fn data_packets(&self, channel: Option<u32>) -> Vec<&Packet> {
        self.packets
            .iter()
            .filter(|p| p.is_data_packet())
            .filter(|p| channel.is_none_or(|c| p.channel == c))
            .collect()
    }

    /// Samples of every data packet, concatenated in stream order.
    pub fn aggregated_samples(&self, channel: Option<u32>) -> Vec<f64> {
        self.data_packets(channel)
            .into_iter()
            .flat_map(|p| p.audio_samples.iter().copied())
            .collect()
    }

    /// Data packets with capture-edge packets removed.
    ///
    /// Trimming applies per channel: `start` leading and `end` trailing
    /// packets of each channel are dropped, unless the channel has no more
    /// than `start + end` packets. Stream order is kept.
    pub fn clean_data_packets(
        &self,
        channel: Option<u32>,
        trim: Option<(usize, usize)>,
    ) -> Vec<&Packet> {
        let packets = self.data_packets(channel);
        let Some((start, end)) = trim else {
            return packets;
        };

        let mut per_channel: HashMap<u32, usize> = HashMap::new();
        for packet in &packets {
            *per_channel.entry(packet.channel).or_default() += 1;
        }
        let mut seen: HashMap<u32, usize> = HashMap::new();
        packets
            .into_iter()
            .filter(|packet| {
                let total = per_channel.get(&packet.channel).copied().unwrap_or(0);
                let position = seen.entry(packet.channel).or_default();
                let keep = total <= start + end || (*position >= start && *position < total - end);
                *position += 1;
                keep
            })
            .collect()
    }
}

fn detect_format(packets: &[Packet]) -> Outcome<StreamFormat> {
    match packets
        .iter()
        .find(|p| p.is_data_packet())
        .and_then(|p| p.header)
    {
        Some(header) => Outcome::Available(StreamFormat::from_fdf(header.fdf)),
        None => Outcome::unavailable("no data packets found to determine format"),
    }
}

#[cfg(test)]
mod tests {
    use super::{Capture, FALLBACK_SAMPLE_RATE};
    use crate::protocols::cip::DbcStatus;
    use crate::source::LogTextSource;

    fn data(channel: u32, dbc: u8, sample: u32) -> String {
        format!(
            "Isoch channel {channel}, tag 1, sy 0, size 12\n   000200{dbc:02x} 90020000 {:08x}\n",
            0x4000_0000 | sample
        )
    }

    #[test]
    fn format_from_first_data_packet() {
        let log = format!(
            "Isoch channel 0, tag 1, sy 0, size 8\n 000200c0 9001ffff\n{}",
            data(0, 0xc8, 1)
        );
        let capture = Capture::from_log_text(&log);
        let format = capture.format().available().unwrap();
        assert_eq!(format.sample_rate, Some(48_000));
        assert_eq!(capture.sample_rate(), 48_000);
        assert_eq!(capture.syt_interval(), 8);
        assert_eq!(capture.packets()[1].dbc_status, DbcStatus::First);
    }

    #[test]
    fn missing_format_falls_back() {
        let capture = Capture::from_log_text("Isoch channel 0, tag 1, sy 0, size 8\n 000200c0 9001ffff\n");
        assert!(!capture.format().is_available());
        assert_eq!(capture.sample_rate(), FALLBACK_SAMPLE_RATE);
        assert_eq!(capture.syt_interval(), 8);
    }

    #[test]
    fn channel_filter_and_aggregation() {
        let log = [data(0, 0x00, 1), data(1, 0x00, 2), data(0, 0x08, 3)].concat();
        let capture = Capture::from_log_text(&log);
        assert_eq!(capture.channels(), vec![0, 1]);
        assert_eq!(capture.data_packets(Some(0)).len(), 2);
        assert_eq!(capture.aggregated_samples(Some(1)).len(), 1);
        assert_eq!(capture.aggregated_samples(None).len(), 3);
    }

    #[test]
    fn trimming_is_per_channel() {
        let mut log = String::new();
        for i in 0..6u8 {
            log.push_str(&data(0, i * 8, u32::from(i)));
            log.push_str(&data(1, i * 8, 100 + u32::from(i)));
        }
        let capture = Capture::from_log_text(&log);
        let clean = capture.clean_data_packets(None, Some((2, 2)));
        let indices: Vec<usize> = clean.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![4, 5, 6, 7]);

        let clean = capture.clean_data_packets(Some(1), Some((2, 1)));
        let indices: Vec<usize> = clean.iter().map(|p| p.index).collect();
        assert_eq!(indices, vec![5, 7, 9]);
    }

    #[test]
    fn text_and_source_builds_agree() {
        let log = format!(
            "{}Isoch channel 0, tag 1, sy 0, size 8\n 000200c8 9002ffff\n{}",
            data(0, 0x00, 1),
            data(0, 0x08, 2)
        );
        let from_text = Capture::from_log_text(&log);
        let from_source = Capture::from_source(&mut LogTextSource::new(&log)).unwrap();
        assert_eq!(from_text.packets(), from_source.packets());
        assert_eq!(from_text.packets().len(), 3);
        assert_eq!(from_text.continuity(), from_source.continuity());
    }

    #[test]
    fn short_channels_are_not_trimmed() {
        let log = [data(0, 0x00, 1), data(0, 0x08, 2), data(0, 0x10, 3)].concat();
        let capture = Capture::from_log_text(&log);
        assert_eq!(capture.clean_data_packets(None, Some((2, 2))).len(), 3);
        assert_eq!(capture.clean_data_packets(None, None).len(), 3);
    }
}

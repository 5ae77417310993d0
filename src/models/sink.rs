use tracing::info;
use crate::models::{common::EffectChannel, traits::EffectSink};

/// コンソールへの効果出力
///
/// 効果時間が正の場合のみ出力する。
#[derive(Debug, Default)]
pub struct ConsoleSink {
    /// 出力した件数
    pub reported: usize,
}

impl EffectSink for ConsoleSink {
    fn apply(&mut self, soldier_id: u32, channel: EffectChannel, duration: f64) {
        if duration <= 0.0 {
            return;
        }

        println!("兵士 {:>3}: {} {:.2}秒", soldier_id, channel, duration);
        info!(
            soldier_id,
            channel = ?channel,
            duration,
            "EFFECT_APPLIED: 効果を適用しました"
        );
        self.reported += 1;
    }
}

/// 適用された効果の記録
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedEffect {
    pub soldier_id: u32,
    pub channel: EffectChannel,
    pub duration: f64,
}

/// 呼び出し順に効果を記録するシンク
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub effects: Vec<AppliedEffect>,
}

impl EffectSink for RecordingSink {
    fn apply(&mut self, soldier_id: u32, channel: EffectChannel, duration: f64) {
        self.effects.push(AppliedEffect {
            soldier_id,
            channel,
            duration,
        });
    }
}

/// 複数のシンクへ同じ効果を転送する
pub struct FanOutSink<'a> {
    pub sinks: Vec<&'a mut dyn EffectSink>,
}

impl EffectSink for FanOutSink<'_> {
    fn apply(&mut self, soldier_id: u32, channel: EffectChannel, duration: f64) {
        for sink in self.sinks.iter_mut() {
            sink.apply(soldier_id, channel, duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_sink_skips_non_positive() {
        let mut sink = ConsoleSink::default();
        sink.apply(1, EffectChannel::Blindness, 0.0);
        sink.apply(1, EffectChannel::Deafness, -3.0);
        assert_eq!(sink.reported, 0);
        sink.apply(2, EffectChannel::Deafness, 12.5);
        assert_eq!(sink.reported, 1);
    }

    #[test]
    fn test_recording_sink_keeps_order() {
        let mut sink = RecordingSink::default();
        sink.apply(4, EffectChannel::Blindness, 1.5);
        sink.apply(4, EffectChannel::Deafness, 45.0);
        sink.apply(9, EffectChannel::Blindness, 0.0);

        assert_eq!(sink.effects.len(), 3);
        assert_eq!(sink.effects[1].channel, EffectChannel::Deafness);
        assert_eq!(sink.effects[2], AppliedEffect { soldier_id: 9, channel: EffectChannel::Blindness, duration: 0.0 });
    }

    #[test]
    fn test_fan_out_sink() {
        let mut console = ConsoleSink::default();
        let mut recording = RecordingSink::default();
        {
            let mut fan_out = FanOutSink {
                sinks: vec![&mut console as &mut dyn EffectSink, &mut recording],
            };
            fan_out.apply(1, EffectChannel::Blindness, 1.0);
            fan_out.apply(1, EffectChannel::Deafness, 0.0);
        }
        assert_eq!(console.reported, 1);
        assert_eq!(recording.effects.len(), 2);
    }
}

// Unit tests for strategy resolution

use super::*;

#[test]
fn test_every_tier_resolves_to_distinct_strategy() {
    let strategies: Vec<EncodingStrategy> = VideoQuality::ALL
        .iter()
        .map(|q| StrategyResolver::resolve(*q, Some(24), true).unwrap())
        .collect();

    for (i, a) in strategies.iter().enumerate() {
        for b in strategies.iter().skip(i + 1) {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_resolution_is_idempotent() {
    for quality in VideoQuality::ALL {
        let first = StrategyResolver::resolve(quality, Some(25), false).unwrap();
        let second = StrategyResolver::resolve(quality, Some(25), false).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_fixed_tier_policies() {
    let low = StrategyResolver::resolve(VideoQuality::LowQuality, None, true).unwrap();
    assert_eq!(
        low.video.resize,
        ResizePolicy::AtMost {
            minor: 360,
            major: None
        }
    );
    assert_eq!(low.video.bit_rate, BitRatePolicy::Estimated);
    assert_eq!(low.video.frame_rate, DEFAULT_FRAME_RATE);
    assert_eq!(low.video.key_frame_interval, 3.0);

    let hd = StrategyResolver::resolve(VideoQuality::Res1920x1080Quality, None, true).unwrap();
    assert_eq!(
        hd.video.resize,
        ResizePolicy::AtMost {
            minor: 1080,
            major: Some(1920)
        }
    );
}

#[test]
fn test_custom_tier_uses_fixed_bit_rate_and_override() {
    let strategy = StrategyResolver::resolve(VideoQuality::HighestQuality, Some(24), true).unwrap();
    assert_eq!(strategy.video.resize, ResizePolicy::PassThrough);
    assert_eq!(strategy.video.bit_rate, BitRatePolicy::Fixed(3_686_400));
    assert_eq!(strategy.video.frame_rate, 24);
}

#[test]
fn test_custom_tier_without_frame_rate_fails() {
    let result = StrategyResolver::resolve(VideoQuality::HighestQuality, None, true);
    assert!(matches!(result, Err(DomainError::InvalidRequest(_))));
}

#[test]
fn test_frame_rate_override_ignored_for_fixed_tiers() {
    let with = StrategyResolver::resolve(VideoQuality::MediumQuality, Some(60), true).unwrap();
    let without = StrategyResolver::resolve(VideoQuality::MediumQuality, None, true).unwrap();
    assert_eq!(with, without);
}

#[test]
fn test_unknown_ordinal_is_rejected() {
    assert_eq!(
        StrategyResolver::resolve_ordinal(42, None, true),
        Err(DomainError::InvalidQuality(42))
    );
}

#[test]
fn test_audio_policy() {
    let keep = StrategyResolver::resolve(VideoQuality::DefaultQuality, None, true).unwrap();
    assert_eq!(keep.audio, AudioTarget::Passthrough);

    let strip = StrategyResolver::resolve(VideoQuality::DefaultQuality, None, false).unwrap();
    assert_eq!(strip.audio, AudioTarget::Remove);
}

#[test]
fn test_output_size_scales_minor_side() {
    let target = StrategyResolver::resolve(VideoQuality::LowQuality, None, true)
        .unwrap()
        .video;
    assert_eq!(target.output_size(1920, 1080), (640, 360));
    assert_eq!(target.output_size(1080, 1920), (360, 640));
}

#[test]
fn test_output_size_respects_major_limit() {
    let target = StrategyResolver::resolve(VideoQuality::Res640x480Quality, None, true)
        .unwrap()
        .video;
    // 16:9 is limited by the major side
    assert_eq!(target.output_size(1920, 1080), (640, 360));
    // 4:3 hits both limits exactly
    assert_eq!(target.output_size(1440, 1080), (640, 480));
}

#[test]
fn test_output_size_never_upscales() {
    let target = StrategyResolver::resolve(VideoQuality::Res1920x1080Quality, None, true)
        .unwrap()
        .video;
    assert_eq!(target.output_size(640, 360), (640, 360));
    assert_eq!(target.output_size(641, 361), (640, 360));
}

#[test]
fn test_effective_frame_rate_capped_by_source() {
    let target = StrategyResolver::resolve(VideoQuality::HighestQuality, Some(60), true)
        .unwrap()
        .video;
    assert_eq!(target.effective_frame_rate(Some(29.97)), 29.97);
    assert_eq!(target.effective_frame_rate(Some(120.0)), 60.0);
    assert_eq!(target.effective_frame_rate(None), 60.0);
}

#[test]
fn test_bit_rate_estimation() {
    let target = StrategyResolver::resolve(VideoQuality::LowQuality, None, true)
        .unwrap()
        .video;
    // 0.14 * 640 * 360 * 30
    assert_eq!(target.bit_rate_for(640, 360, 30.0), 967_680);

    let custom = StrategyResolver::resolve(VideoQuality::HighestQuality, Some(30), true)
        .unwrap()
        .video;
    assert_eq!(custom.bit_rate_for(640, 360, 30.0), CUSTOM_TIER_BIT_RATE);
}

#[test]
fn test_gop_size() {
    let target = StrategyResolver::resolve(VideoQuality::DefaultQuality, None, true)
        .unwrap()
        .video;
    assert_eq!(target.gop_size(30.0), 90);
    assert_eq!(target.gop_size(0.0), 1);
}

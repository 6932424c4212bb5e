//! Thread lifecycle and handoff behavior of the background mic sampler.

use std::time::Duration;

use groover_core::config::SamplingCfg;
use groover_core::mocks::SilentMic;
use groover_core::sampler::MicSampler;
use groover_traits::clock::MonotonicClock;

fn fast_cfg() -> SamplingCfg {
    // Keep the wall-clock cost of a block low: 64 samples at 32 kHz = 2 ms.
    SamplingCfg {
        rate_hz: 32_000,
        block_samples: 64,
        mic_offset: 1_523,
    }
}

#[test]
fn produces_whole_blocks_and_shuts_down_on_drop() {
    let cfg = fast_cfg();
    let sampler = MicSampler::spawn(SilentMic { offset: 1_523 }, &cfg, MonotonicClock::new());

    let block = sampler
        .recv_block(Duration::from_secs(2))
        .expect("a block should arrive");
    assert_eq!(block.len(), cfg.block_samples);
    assert!(block.iter().all(|&s| s == 1_523));

    // Production continues block after block.
    assert!(sampler.recv_block(Duration::from_secs(2)).is_some());

    // Drop joins the thread; if the shutdown flag were broken this would
    // hang the test rather than pass.
    drop(sampler);
}

#[test]
fn unconsumed_blocks_are_dropped_not_queued() {
    let cfg = fast_cfg();
    let sampler = MicSampler::spawn(SilentMic { offset: 1_523 }, &cfg, MonotonicClock::new());

    // Let many block periods elapse without consuming.
    std::thread::sleep(Duration::from_millis(50));

    // The handoff is bounded: of the ~25 blocks produced, at most one is
    // pending (plus one that may land while draining). The rest were
    // dropped, not queued.
    let mut drained = 0;
    while sampler.try_block().is_some() {
        drained += 1;
        assert!(drained <= 2, "blocks must not queue up");
    }
    assert!(drained >= 1, "one block should have been pending");

    // Consuming made room for the next.
    assert!(sampler.recv_block(Duration::from_secs(2)).is_some());
}

#[test]
fn erroring_mic_produces_no_blocks_but_drop_still_joins() {
    struct BrokenMic;
    impl groover_traits::Microphone for BrokenMic {
        fn read_sample(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
            Err("adc offline".into())
        }
    }

    let cfg = fast_cfg();
    let sampler = MicSampler::spawn(BrokenMic, &cfg, MonotonicClock::new());
    assert!(sampler.recv_block(Duration::from_millis(50)).is_none());
    drop(sampler);
}

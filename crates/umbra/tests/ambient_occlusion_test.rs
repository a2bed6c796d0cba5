//! Ambient occlusion pass integration tests on the recording device.

use std::rc::Rc;

use proptest::prelude::*;
use umbra::*;

fn frame(device: &HeadlessDevice, size: UVec2) -> FrameContext {
    let color = device
        .create_texture(&TextureDesc::render_target(
            "scene color",
            size,
            wgpu::TextureFormat::Rgba8Unorm,
        ))
        .unwrap();
    let depth = device
        .create_texture(&TextureDesc::render_target(
            "scene depth",
            size,
            wgpu::TextureFormat::Depth32Float,
        ))
        .unwrap();
    FrameContext::forward(color, depth, size)
}

fn deferred_frame(device: &HeadlessDevice, size: UVec2) -> FrameContext {
    let normal = device
        .create_texture(&TextureDesc::render_target(
            "scene normals",
            size,
            wgpu::TextureFormat::Rgba8Unorm,
        ))
        .unwrap();
    frame(device, size).with_render_path(RenderPath::Deferred { normal })
}

/// Blur draws always read the target the previous draw wrote.
fn assert_ping_pong(draws: &[DrawRecord]) {
    let evaluate = &draws[0];
    let mut last_written = evaluate.target;
    for blur in &draws[1..=BLUR_ITERATIONS] {
        assert_eq!(blur.label, "ssao blur");
        assert_eq!(blur.sources[0], last_written);
        assert_ne!(blur.target, last_written);
        last_written = blur.target;
    }
    let composite = &draws[BLUR_ITERATIONS + 1];
    assert_eq!(composite.sources, vec![last_written]);
}

#[test]
fn test_forward_and_deferred_frames() {
    let device = Rc::new(HeadlessDevice::new());
    let mut pass = AmbientOcclusionPass::new(device.clone(), AmbientOcclusionSettings::default());
    let camera = Camera::new(16.0 / 9.0);

    let forward = frame(&device, UVec2::new(1280, 720));
    assert!(pass.execute(&forward, Some(&camera)).is_applied());
    assert_ping_pong(&device.take_draws());

    let deferred = deferred_frame(&device, UVec2::new(1280, 720));
    assert!(pass.execute(&deferred, Some(&camera)).is_applied());
    let draws = device.take_draws();
    assert_ping_pong(&draws);
    assert_eq!(draws[0].pipeline, "ssao evaluate deferred");
    assert_eq!(draws[1].pipeline, "ssao blur deferred");
}

#[test]
fn test_configure_is_idempotent() {
    let device = Rc::new(HeadlessDevice::new());
    let settings = AmbientOcclusionSettings::default();
    let mut pass = AmbientOcclusionPass::new(device.clone(), settings.clone());
    let frame = frame(&device, UVec2::new(640, 480));
    pass.execute(&frame, Some(&Camera::default()));
    assert_eq!(pass.state(), PassState::Executable);

    let textures = device.textures_created();
    let pipelines = device.pipelines_created();
    pass.configure(settings.clone()).unwrap();
    pass.configure(settings).unwrap();
    assert_eq!(pass.state(), PassState::Executable);
    assert!(pass.execute(&frame, Some(&Camera::default())).is_applied());
    assert_eq!(device.textures_created(), textures);
    assert_eq!(device.pipelines_created(), pipelines);
}

#[test]
fn test_uniform_only_change_keeps_resources() {
    let device = Rc::new(HeadlessDevice::new());
    let mut pass = AmbientOcclusionPass::new(device.clone(), AmbientOcclusionSettings::default());
    let frame = frame(&device, UVec2::new(640, 480));
    pass.execute(&frame, Some(&Camera::default()));
    let textures = device.textures_created();
    let pipelines = device.pipelines_created();

    pass.configure(AmbientOcclusionSettings {
        strength: 1.0,
        radius_far: 2.0,
        blur_radius: 2.0,
        ..AmbientOcclusionSettings::default()
    })
    .unwrap();
    assert_eq!(pass.state(), PassState::Executable);
    assert!(pass.execute(&frame, Some(&Camera::default())).is_applied());
    assert_eq!(device.textures_created(), textures);
    assert_eq!(device.pipelines_created(), pipelines);
}

#[test]
fn test_one_failed_state_disables_the_pass() {
    let device = Rc::new(HeadlessDevice::new());
    device.fail_pipelines_matching("ssao blur deferred");
    let mut pass = AmbientOcclusionPass::new(device.clone(), AmbientOcclusionSettings::default());
    let frame = frame(&device, UVec2::new(320, 200));

    // Forward frames never use the failing state, but validity is all or nothing.
    assert_eq!(
        pass.execute(&frame, Some(&Camera::default())),
        PassOutcome::Skipped(SkipReason::ResourcesUnavailable)
    );
    assert!(device.draws().is_empty());
    assert_ne!(pass.state(), PassState::Executable);
    assert!(pass.pipeline_states().is_some_and(|s| !s.is_valid()));

    // Failure is sticky until the settings change.
    device.clear_pipeline_failures();
    assert!(!pass.execute(&frame, Some(&Camera::default())).is_applied());

    pass.configure(AmbientOcclusionSettings {
        quality: AmbientOcclusionQuality::Low,
        ..AmbientOcclusionSettings::default()
    })
    .unwrap();
    assert!(pass.execute(&frame, Some(&Camera::default())).is_applied());
    assert_eq!(pass.state(), PassState::Executable);
}

#[test]
fn test_missing_inputs_are_skipped() {
    let device = Rc::new(HeadlessDevice::new());
    let mut pass = AmbientOcclusionPass::new(device.clone(), AmbientOcclusionSettings::default());
    let mut frame = frame(&device, UVec2::new(64, 64));

    assert_eq!(
        pass.execute(&frame, None),
        PassOutcome::Skipped(SkipReason::MissingCamera)
    );
    frame.depth = None;
    assert_eq!(
        pass.execute(&frame, Some(&Camera::default())),
        PassOutcome::Skipped(SkipReason::MissingDepth)
    );
    assert!(device.draws().is_empty());
    assert!(pass
        .execution_flags()
        .contains(PostProcessPassFlags::NEED_COLOR_OUTPUT_BILINEAR));
}

#[test]
fn test_settings_from_json() {
    let settings = AmbientOcclusionSettings::from_json(
        r#"{ "downscale": 2, "quality": "High", "preview": true }"#,
    )
    .unwrap();
    assert_eq!(settings.downscale, 2);
    assert_eq!(settings.quality.sample_count(), 32);

    let device = Rc::new(HeadlessDevice::new());
    let mut pass = AmbientOcclusionPass::new(device.clone(), settings);
    let frame = frame(&device, UVec2::new(800, 600));
    assert!(pass.execute(&frame, Some(&Camera::default())).is_applied());
    assert_eq!(pass.target_size(), Some(UVec2::new(400, 300)));
    let draws = device.draws();
    assert_eq!(draws.last().unwrap().label, "ssao preview");

    assert!(AmbientOcclusionSettings::from_json(r#"{ "downscale": 0 }"#).is_err());
}

proptest! {
    #[test]
    fn prop_ping_pong_any_size(
        width in 1u32..2048,
        height in 1u32..2048,
        downscale in 1u32..4,
    ) {
        let device = Rc::new(HeadlessDevice::new());
        let settings = AmbientOcclusionSettings {
            downscale,
            ..AmbientOcclusionSettings::default()
        };
        let mut pass = AmbientOcclusionPass::new(device.clone(), settings);
        let frame = frame(&device, UVec2::new(width, height));
        prop_assert!(pass.execute(&frame, Some(&Camera::default())).is_applied());
        let draws = device.take_draws();
        prop_assert_eq!(draws.len(), BLUR_ITERATIONS + 2);
        assert_ping_pong(&draws);
        let size = pass.target_size().unwrap();
        prop_assert!(size.x >= 1 && size.y >= 1);
    }
}

//! Frame resolution through the public API, on the manual clock.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen_test::*;

use render_timing::TimerConfig;
use render_timing::backend::Timebase;
use render_timing::backends::manual::{ManualBackend, ManualDevice};
use render_timing::debug::DebugSink;
use render_timing::shader::{ShaderCombinationKey, ShaderHandle, ShaderNames};
use render_timing::timer::DrawcallTimer;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const KEY_A: (u64, u64) = (0xa1, 0xa2);
const KEY_B: (u64, u64) = (0xb1, 0xb2);

fn key((vertex, fragment): (u64, u64)) -> ShaderCombinationKey {
    ShaderCombinationKey::new(ShaderHandle::new(vertex), ShaderHandle::new(fragment))
}

fn names((vertex, fragment): (u64, u64)) -> ShaderNames {
    ShaderNames {
        vertex: Some(format!("{vertex:#x}")),
        fragment: Some(format!("{fragment:#x}")),
        ..Default::default()
    }
}

fn setup() -> (ManualDevice, DrawcallTimer<ManualBackend>) {
    let device = ManualDevice::new();
    let timer = DrawcallTimer::new(device.backend(), DebugSink::silent());
    (device, timer)
}

fn drawcall(timer: &mut DrawcallTimer<ManualBackend>, device: &ManualDevice, k: (u64, u64), ticks: u64) {
    timer.start(key(k));
    device.advance(ticks);
    timer.end();
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn empty_before_first_frame() {
    let (_device, timer) = setup();
    assert!(timer.shader_times().is_empty());
    assert_eq!(timer.last_frame_gpu_time(), 0.0);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn same_key_is_summed() {
    let (device, mut timer) = setup();
    drawcall(&mut timer, &device, KEY_A, 1_000);
    device.advance(100);
    drawcall(&mut timer, &device, KEY_A, 2_500);
    timer.advance_frame();

    let times = timer.shader_times();
    assert_eq!(times.len(), 1);
    assert_eq!(times[&names(KEY_A)], 3.5);
    assert_eq!(timer.last_frame_gpu_time(), 3.6);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn distinct_keys_stay_apart() {
    let (device, mut timer) = setup();
    drawcall(&mut timer, &device, KEY_A, 1_000);
    drawcall(&mut timer, &device, KEY_B, 4_000);
    timer.advance_frame();

    let times = timer.shader_times();
    assert_eq!(times.len(), 2);
    assert_eq!(times[&names(KEY_A)], 1.0);
    assert_eq!(times[&names(KEY_B)], 4.0);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn eye_index_splits_keys() {
    let (device, mut timer) = setup();
    timer.start(key(KEY_A));
    device.advance(1_000);
    timer.end();
    timer.start(key(KEY_A).with_eye_index(1));
    device.advance(2_000);
    timer.end();
    timer.advance_frame();

    let left = names(KEY_A);
    let right = ShaderNames {
        eye_index: 1,
        ..names(KEY_A)
    };
    assert_eq!(timer.shader_times()[&left], 1.0);
    assert_eq!(timer.shader_times()[&right], 2.0);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn results_are_replaced_not_merged() {
    let (device, mut timer) = setup();
    drawcall(&mut timer, &device, KEY_A, 1_000);
    timer.advance_frame();
    drawcall(&mut timer, &device, KEY_B, 2_000);
    timer.advance_frame();

    let times = timer.shader_times();
    assert_eq!(times.len(), 1);
    assert_eq!(times[&names(KEY_B)], 2.0);

    //a frame with no drawcalls publishes an empty map
    timer.advance_frame();
    assert!(timer.shader_times().is_empty());
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn disjoint_frame_leaves_results_alone() {
    let (device, mut timer) = setup();
    drawcall(&mut timer, &device, KEY_A, 1_000);
    timer.advance_frame();
    let before = timer.shader_times().clone();
    let frame_before = timer.last_frame_gpu_time();

    drawcall(&mut timer, &device, KEY_B, 7_000);
    device.mark_disjoint();
    timer.advance_frame();

    assert_eq!(timer.shader_times(), &before);
    assert_eq!(timer.last_frame_gpu_time(), frame_before);
    assert_eq!(timer.discarded_frames(), 1);
    //the discarded frame's queries still went back to the pool
    assert_eq!(timer.pooled_query_pairs(), timer.allocated_query_pairs());

    //the next frame is unaffected
    drawcall(&mut timer, &device, KEY_B, 3_000);
    timer.advance_frame();
    assert_eq!(timer.shader_times()[&names(KEY_B)], 3.0);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn disjoint_is_reported() {
    let device = ManualDevice::new();
    let messages = Arc::new(Mutex::new(Vec::<String>::new()));
    let move_messages = messages.clone();
    let mut timer = DrawcallTimer::new(
        device.backend(),
        DebugSink::new(move |m| move_messages.lock().unwrap().push(m.to_owned())),
    );
    timer.advance_frame();
    messages.lock().unwrap().clear();
    device.mark_disjoint();
    timer.advance_frame();
    assert_eq!(
        messages.lock().unwrap().as_slice(),
        ["Disjoint! Throwing away current frame".to_string()]
    );
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn wrapped_counter_gives_true_elapsed() {
    let (device, mut timer) = setup();
    device.set_counter_bits(32);
    device.set_clock(0xFFFF_F000);
    timer.advance_frame();

    //0x1000 ticks before the wrap, 0x800 after
    drawcall(&mut timer, &device, KEY_A, 0x1800);
    timer.advance_frame();
    assert_eq!(timer.shader_times()[&names(KEY_A)], 6.144);
    assert_eq!(timer.last_frame_gpu_time(), 6.144);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn unavailable_results_count_as_zero() {
    let (device, mut timer) = setup();
    drawcall(&mut timer, &device, KEY_A, 1_000);
    //the next start timestamp is lost
    device.withhold_next_writes(1);
    drawcall(&mut timer, &device, KEY_A, 5_000);
    drawcall(&mut timer, &device, KEY_B, 2_000);
    timer.advance_frame();

    let times = timer.shader_times();
    assert_eq!(times[&names(KEY_A)], 1.0);
    assert_eq!(times[&names(KEY_B)], 2.0);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn late_validity_times_out() {
    let device = ManualDevice::new();
    let config = TimerConfig {
        validity_timeout: Duration::from_millis(5),
        ..TimerConfig::default()
    };
    device.set_validity_latency(u32::MAX);
    let mut timer = DrawcallTimer::with_config(device.backend(), config, DebugSink::silent());
    drawcall(&mut timer, &device, KEY_A, 1_000);
    timer.advance_frame();

    assert!(timer.shader_times().is_empty());
    assert_eq!(timer.last_frame_gpu_time(), 0.0);
    assert_eq!(timer.discarded_frames(), 1);
    assert!(device.waits() > 0);
    assert_eq!(timer.frame_counter(), 1);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn nanosecond_timebase() {
    let device = ManualDevice::with_timebase(Timebase::NANOSECONDS);
    let mut timer = DrawcallTimer::new(device.backend(), DebugSink::silent());
    drawcall(&mut timer, &device, KEY_A, 250_000);
    timer.advance_frame();
    assert_eq!(timer.shader_times()[&names(KEY_A)], 0.25);
}

#[cfg_attr(not(target_arch = "wasm32"), test)]
#[cfg_attr(target_arch = "wasm32", wasm_bindgen_test)]
fn labels_name_the_stages() {
    let (device, mut timer) = setup();
    device.label_shader(ShaderHandle::new(KEY_A.0).unwrap(), "terrain_vs");
    device.label_shader(ShaderHandle::new(KEY_A.1).unwrap(), "terrain_fs");
    let geometry = ShaderHandle::new(0x99);
    timer.start(key(KEY_A).with_geometry(geometry));
    device.advance(500);
    timer.end();
    timer.advance_frame();

    let (names, time) = timer.shader_times().iter().next().unwrap();
    assert_eq!(names.to_string(), "vertex=terrain_vs geometry=0x99 fragment=terrain_fs");
    assert_eq!(*time, 0.5);
}

//! Brightness rescaling between the UI's 0–20 slider and the firmware's
//! 0–255 range.
//!
//! LED payloads come in two shapes: the legacy `leds.config[]` list and the
//! layered `leds.layers[].layer-config[]` form. Both carry an optional global
//! `leds.brightness`; layers carry their own `brightness` too. Every numeric
//! `brightness` found at those places is converted; everything else in the
//! payload is left as-is.

use serde_json::Value;

pub const UI_MAX: f64 = 20.0;
pub const FIRMWARE_MAX: f64 = 255.0;

pub fn ui_to_firmware(ui: f64) -> u8 {
    let ui = ui.clamp(0.0, UI_MAX);
    (ui / UI_MAX * FIRMWARE_MAX).round() as u8
}

pub fn firmware_to_ui(firmware: f64) -> u8 {
    let firmware = firmware.clamp(0.0, FIRMWARE_MAX);
    (firmware / FIRMWARE_MAX * UI_MAX).round() as u8
}

/// Copy of `data` with brightness values in firmware scale.
pub fn leds_to_firmware(data: &Value) -> Value {
    let mut out = data.clone();
    rescale_leds(&mut out, ui_to_firmware);
    out
}

/// Copy of `data` with brightness values in UI scale.
pub fn leds_to_ui(data: &Value) -> Value {
    let mut out = data.clone();
    rescale_leds(&mut out, firmware_to_ui);
    out
}

fn rescale_leds(data: &mut Value, convert: fn(f64) -> u8) {
    let Some(leds) = data.get_mut("leds") else {
        return;
    };
    rescale_field(leds, convert);

    let layered = leds.get("layers").is_some_and(Value::is_array);
    if layered {
        for layer in array_mut(leds, "layers") {
            rescale_field(layer, convert);
            for led in array_mut(layer, "layer-config") {
                rescale_field(led, convert);
            }
        }
    } else {
        for led in array_mut(leds, "config") {
            rescale_field(led, convert);
        }
    }
}

fn array_mut<'a>(value: &'a mut Value, key: &str) -> impl Iterator<Item = &'a mut Value> {
    value
        .get_mut(key)
        .and_then(Value::as_array_mut)
        .into_iter()
        .flatten()
}

fn rescale_field(target: &mut Value, convert: fn(f64) -> u8) {
    if let Some(slot) = target.get_mut("brightness") {
        if let Some(raw) = slot.as_f64() {
            *slot = Value::from(convert(raw));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ui_scale_round_trips_through_firmware() {
        for v in 0..=20u8 {
            assert_eq!(firmware_to_ui(ui_to_firmware(v as f64) as f64), v, "ui {v}");
        }
    }

    #[test]
    fn firmware_to_ui_is_monotonic() {
        let mut previous = 0;
        for f in 0..=255u16 {
            let ui = firmware_to_ui(f as f64);
            assert!(ui >= previous, "firmware {f}");
            previous = ui;
        }
        assert_eq!(previous, 20);
    }

    #[test]
    fn conversions_clamp_out_of_range_input() {
        assert_eq!(ui_to_firmware(-3.0), 0);
        assert_eq!(ui_to_firmware(99.0), 255);
        assert_eq!(firmware_to_ui(-1.0), 0);
        assert_eq!(firmware_to_ui(1000.0), 20);
    }

    #[test]
    fn known_points() {
        assert_eq!(ui_to_firmware(5.0), 64);
        assert_eq!(ui_to_firmware(10.0), 128);
        assert_eq!(firmware_to_ui(127.0), 10);
    }

    #[test]
    fn legacy_shape_converts_global_and_per_led() {
        let fw = json!({"leds": {"brightness": 255, "config": [
            {"id": 0, "brightness": 51},
            {"id": 1, "color": "#ff0000"}
        ]}});
        let ui = leds_to_ui(&fw);
        assert_eq!(ui["leds"]["brightness"], 20);
        assert_eq!(ui["leds"]["config"][0]["brightness"], 4);
        assert_eq!(ui["leds"]["config"][1], json!({"id": 1, "color": "#ff0000"}));
    }

    #[test]
    fn layered_shape_converts_layers_and_their_leds() {
        let ui = json!({"leds": {"brightness": 5, "layers": [
            {"layer-name": "base", "brightness": 20, "layer-config": [{"brightness": 10}]},
            {"layer-name": "fn"}
        ], "config": [{"brightness": 20}]}});
        let fw = leds_to_firmware(&ui);
        assert_eq!(fw["leds"]["brightness"], 64);
        assert_eq!(fw["leds"]["layers"][0]["brightness"], 255);
        assert_eq!(fw["leds"]["layers"][0]["layer-config"][0]["brightness"], 128);
        assert_eq!(fw["leds"]["layers"][1], json!({"layer-name": "fn"}));
        // the legacy list is ignored once layers are present
        assert_eq!(fw["leds"]["config"][0]["brightness"], 20);
    }

    #[test]
    fn payloads_without_leds_or_numbers_are_untouched() {
        let other = json!({"components": []});
        assert_eq!(leds_to_ui(&other), other);
        let odd = json!({"leds": {"brightness": "max"}});
        assert_eq!(leds_to_firmware(&odd), odd);
    }

    #[test]
    fn input_is_not_mutated() {
        let ui = json!({"leds": {"brightness": 5}});
        let _ = leds_to_firmware(&ui);
        assert_eq!(ui["leds"]["brightness"], 5);
    }
}

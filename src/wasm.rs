#![cfg(target_arch = "wasm32")]

use crate::diagnostics::Diagnostics;
use crate::engine::{
    flag_catalog, model_catalog, param_catalog, Engine, ModelConfig, ModelInfo, TickPolicy,
    MODEL_COLLISION, MODEL_PENDULUM, MODEL_PROJECTILE, MODEL_PROJECTILE_3D,
    MODEL_ROTATING_SPRING, MODEL_SPRINGS,
};
use crate::error::EngineError;
use crate::models::collision::CollisionParams;
use crate::models::pendulum::PendulumSettings;
use crate::models::projectile::ProjectileParams;
use crate::models::rotating_spring::RotatingSpringSettings;
use crate::models::springs::SpringsConfig;
use crate::models::Scene;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;

fn to_js(e: EngineError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn parse<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| JsValue::from_str(&format!("invalid params: {}", e)))
}

#[wasm_bindgen]
pub fn available_models() -> js_sys::Array {
    let out = js_sys::Array::new();
    for info in model_catalog() {
        out.push(&model_info_to_js(info));
    }
    out
}

/// Slider catalog for a model: `[{ name, label, unit, min, max, default }]`.
#[wasm_bindgen]
pub fn model_params(model_id: &str) -> Result<JsValue, JsValue> {
    let specs = param_catalog(model_id).map_err(to_js)?;
    Ok(serde_wasm_bindgen::to_value(specs).unwrap_or(JsValue::NULL))
}

#[wasm_bindgen]
pub fn model_flags(model_id: &str) -> Result<JsValue, JsValue> {
    let specs = flag_catalog(model_id).map_err(to_js)?;
    Ok(serde_wasm_bindgen::to_value(specs).unwrap_or(JsValue::NULL))
}

/// Default parameter object for `WasmSim::set_params`.
#[wasm_bindgen]
pub fn model_defaults(model_id: &str) -> Result<JsValue, JsValue> {
    let value = match model_id {
        MODEL_PROJECTILE | MODEL_PROJECTILE_3D => {
            serde_wasm_bindgen::to_value(&ProjectileParams::default())
        }
        MODEL_PENDULUM => serde_wasm_bindgen::to_value(&PendulumSettings::default()),
        MODEL_COLLISION => serde_wasm_bindgen::to_value(&CollisionParams::default()),
        MODEL_SPRINGS => serde_wasm_bindgen::to_value(&SpringsConfig::default()),
        MODEL_ROTATING_SPRING => serde_wasm_bindgen::to_value(&RotatingSpringSettings::default()),
        _ => return Err(to_js(EngineError::UnknownModel(model_id.to_string()))),
    };
    Ok(value.unwrap_or(JsValue::NULL))
}

fn model_info_to_js(info: &ModelInfo) -> JsValue {
    let obj = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&obj, &JsValue::from_str("id"), &JsValue::from_str(info.id));
    let _ = js_sys::Reflect::set(&obj, &JsValue::from_str("name"), &JsValue::from_str(info.name));
    let _ = js_sys::Reflect::set(
        &obj,
        &JsValue::from_str("description"),
        &JsValue::from_str(info.description),
    );
    let _ = js_sys::Reflect::set(
        &obj,
        &JsValue::from_str("tickPolicy"),
        &serde_wasm_bindgen::to_value(&info.tick_policy).unwrap_or(JsValue::NULL),
    );
    JsValue::from(obj)
}

#[wasm_bindgen]
pub struct WasmSim {
    engine: Engine,
}

#[wasm_bindgen]
impl WasmSim {
    #[wasm_bindgen(constructor)]
    pub fn new(model_id: &str) -> Result<WasmSim, JsValue> {
        let engine = Engine::new(model_id).map_err(to_js)?;
        Ok(WasmSim { engine })
    }

    pub fn model_id(&self) -> String {
        self.engine.model_id().to_string()
    }

    pub fn is_running(&self) -> bool {
        self.engine.is_running()
    }

    pub fn run(&mut self) -> Result<(), JsValue> {
        self.engine.run().map_err(to_js)
    }

    pub fn pause(&mut self) {
        self.engine.pause();
    }

    pub fn toggle(&mut self) -> Result<bool, JsValue> {
        self.engine.toggle().map_err(to_js)
    }

    pub fn reset(&mut self) {
        self.engine.reset();
    }

    /// Advance one animation frame. Returns the tick outcome, or `null`
    /// while paused.
    pub fn frame(&mut self, timestamp_ms: f64) -> JsValue {
        match self.engine.advance(timestamp_ms) {
            Some(outcome) => serde_wasm_bindgen::to_value(&outcome).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    /// Like `frame`, then hands the scene to `render` and the readouts
    /// to `panel`.
    #[wasm_bindgen(js_name = "frameWith")]
    pub fn frame_with(
        &mut self,
        timestamp_ms: f64,
        render: &js_sys::Function,
        panel: &js_sys::Function,
    ) -> JsValue {
        let mut renderer = |scene: &Scene| {
            if let Ok(v) = serde_wasm_bindgen::to_value(scene) {
                let _ = render.call1(&JsValue::NULL, &v);
            }
        };
        let mut control_panel = |d: &Diagnostics| {
            if let Ok(v) = serde_wasm_bindgen::to_value(d) {
                let _ = panel.call1(&JsValue::NULL, &v);
            }
        };
        match self.engine.frame(timestamp_ms, &mut renderer, &mut control_panel) {
            Some(outcome) => serde_wasm_bindgen::to_value(&outcome).unwrap_or(JsValue::NULL),
            None => JsValue::NULL,
        }
    }

    /// Returns the value actually applied after clamping.
    pub fn set_param(&mut self, name: &str, value: f64) -> Result<f64, JsValue> {
        self.engine.set_param(name, value).map_err(to_js)
    }

    pub fn set_flag(&mut self, name: &str, on: bool) -> Result<(), JsValue> {
        self.engine.set_flag(name, on).map_err(to_js)
    }

    /// Pendulum only; `number` is 1-based.
    pub fn set_segment(&mut self, number: usize, on: bool) -> Result<(), JsValue> {
        self.engine.set_segment(number, on).map_err(to_js)
    }

    /// Load a whole parameter object (see `model_defaults`).
    pub fn set_params(&mut self, params: JsValue) -> Result<(), JsValue> {
        let config = match self.engine.model_id() {
            MODEL_PROJECTILE | MODEL_PROJECTILE_3D => ModelConfig::Projectile(parse(params)?),
            MODEL_PENDULUM => ModelConfig::Pendulum(parse(params)?),
            MODEL_COLLISION => ModelConfig::Collision(parse(params)?),
            MODEL_SPRINGS => ModelConfig::Springs(parse(params)?),
            MODEL_ROTATING_SPRING => ModelConfig::RotatingSpring(parse(params)?),
            other => return Err(to_js(EngineError::UnknownModel(other.to_string()))),
        };
        self.engine.apply_config(config).map_err(to_js)
    }

    /// `{ kind: "fixed", dt }` or `{ kind: "elapsed", max_dt }`.
    pub fn set_tick_policy(&mut self, policy: JsValue) -> Result<(), JsValue> {
        let policy: TickPolicy = parse(policy)?;
        self.engine.set_tick_policy(policy);
        Ok(())
    }

    pub fn scene(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.engine.scene()).unwrap_or(JsValue::NULL)
    }

    pub fn diagnostics(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.engine.diagnostics()).unwrap_or(JsValue::NULL)
    }

    pub fn diagnostics_text(&self) -> String {
        self.engine.diagnostics().to_string()
    }
}

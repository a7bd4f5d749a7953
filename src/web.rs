use crate::{
    keys::GestureChannel,
    settings::SettingsStore,
    state::SharedState,
};
use serde_json::{json, Map, Value};
use std::{
    sync::{Arc, RwLock},
    thread,
};
use tiny_http::{Header, Method, Response, Server, StatusCode};

type Body = Response<std::io::Cursor<Vec<u8>>>;

fn ok_json(v: Value) -> Body {
    Response::from_string(v.to_string())
        .with_header(Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap())
}

fn bad(code: u16, msg: &str) -> Body {
    Response::from_string(msg).with_status_code(StatusCode(code))
}

fn read_body(req: &mut tiny_http::Request) -> Vec<u8> {
    let mut buf = Vec::new();
    let _ = req.as_reader().read_to_end(&mut buf);
    buf
}

/// Runtime status plus the effective (parsed) settings.
pub fn build_state_json(shared: &RwLock<SharedState>, settings: &SettingsStore) -> Value {
    let state = serde_json::to_value(&*shared.read().unwrap()).unwrap_or_else(|_| json!({}));

    let bindings: Map<String, Value> = GestureChannel::ALL
        .iter()
        .map(|c| (c.name().to_string(), json!(settings.binding(*c).as_setting())))
        .collect();
    let doze = settings.doze_features();

    json!({
        "state": state,
        "effective": {
            "hardware_keys_disabled": settings.hardware_keys_disabled(),
            "proximity_check": settings.proximity_check_enabled(),
            "gesture_feedback": settings.gesture_feedback_enabled(),
            "doze": { "wave": doze.wave, "pocket": doze.pocket, "tilt": doze.tilt },
            "slider": settings.slider_map().to_setting(),
            "bindings": bindings,
        },
    })
}

/// Merge a flat JSON object of scalar values into the store.
pub fn apply_settings_body(settings: &SettingsStore, body: &[u8]) -> Result<Vec<String>, String> {
    let updates: Map<String, Value> = serde_json::from_slice(body).map_err(|e| e.to_string())?;
    if let Some((k, _)) = updates
        .iter()
        .find(|(_, v)| !matches!(v, Value::Bool(_) | Value::String(_) | Value::Number(_)))
    {
        return Err(format!("{}: only strings, numbers and booleans are allowed", k));
    }
    settings.set_many(updates).map_err(|e| e.to_string())
}

fn route(
    method: &Method,
    url: &str,
    body: &[u8],
    shared: &RwLock<SharedState>,
    settings: &SettingsStore,
) -> Body {
    match (method, url) {
        (Method::Get, "/api/state") => ok_json(build_state_json(shared, settings)),
        (Method::Get, "/api/settings") => ok_json(Value::Object(settings.snapshot())),
        (Method::Post, "/api/settings") => match apply_settings_body(settings, body) {
            Ok(changed) => {
                log::info!("WEB: settings updated {:?}", changed);
                ok_json(json!({ "changed": changed, "rev": settings.rev() }))
            }
            Err(e) => {
                shared.write().unwrap().last_settings_error = Some(e.clone());
                bad(400, &e)
            }
        },
        _ => bad(404, "not found"),
    }
}

pub fn spawn(shared: Arc<RwLock<SharedState>>, settings: Arc<SettingsStore>, bind_addr: String) {
    thread::spawn(move || {
        let server = match Server::http(bind_addr.as_str()) {
            Ok(s) => s,
            Err(e) => {
                log::error!("WEB: failed to bind {}: {}", bind_addr, e);
                return;
            }
        };
        log::info!("WEB: http://{}", bind_addr);

        for mut req in server.incoming_requests() {
            let url = req.url().to_string();
            let method = req.method().clone();
            let body = if matches!(method, Method::Post) {
                read_body(&mut req)
            } else {
                Vec::new()
            };

            let resp = route(&method, &url, &body, &shared, &settings);
            let _ = req.respond(resp);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{binding_key, KEY_SLIDER_MAPPING};

    #[test]
    fn post_merges_scalars_and_notifies() {
        let settings = SettingsStore::in_memory();
        let rx = settings.subscribe();
        let mut updates = Map::new();
        updates.insert(KEY_SLIDER_MAPPING.to_string(), json!("1,4,2"));
        updates.insert(binding_key(GestureChannel::V), json!("disabled"));
        let body = Value::Object(updates).to_string();

        let mut changed = apply_settings_body(&settings, body.as_bytes()).unwrap();
        changed.sort();
        assert_eq!(changed.len(), 2);
        assert!(rx.try_recv().unwrap().touches(KEY_SLIDER_MAPPING));

        let shared = RwLock::new(SharedState::new());
        let v = build_state_json(&shared, &settings);
        assert_eq!(v["effective"]["slider"], "1,4,2");
        assert_eq!(v["effective"]["bindings"]["v"], "disabled");
        assert_eq!(v["effective"]["bindings"]["circle"], "camera");
        assert_eq!(v["state"]["info"]["screen_on"], true);
    }

    #[test]
    fn nested_values_are_rejected() {
        let settings = SettingsStore::in_memory();
        let err = apply_settings_body(&settings, br#"{"a":{"b":1}}"#).unwrap_err();
        assert!(err.starts_with("a:"));
        assert!(apply_settings_body(&settings, b"[1]").is_err());
        assert_eq!(settings.rev(), 0);
    }
}

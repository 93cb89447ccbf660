//! Tool Calls
//!
//! Bridges the conversational layer to [`MotionController`]. A tool call is a
//! function name plus a JSON object of named parameters; [`dispatch`] maps it
//! onto the matching controller operation and returns its status string.
//!
//! # Line Format
//!
//! The daemon reads one call per line:
//!
//! ```text
//! nod_yes times=3
//! move_head left duration=1.2
//! move_antennas {"right": 45, "left": -45}
//! ```
//!
//! Bare words fill parameters in declaration order. `key=value` pairs set
//! parameters by name. A trailing JSON object is taken as the whole argument
//! map.

use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::controller::MotionController;

/// Errors from parsing a tool-call line
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolError {
    /// Nothing to parse
    #[error("Empty tool call")]
    Empty,

    /// Argument JSON was not an object or did not parse
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// More bare words than the tool has parameters
    #[error("Too many arguments for {tool}: {value}")]
    TooManyArguments {
        /// Tool name
        tool: String,
        /// First value with nowhere to go
        value: String,
    },
}

// =============================================================================
// Declarations
// =============================================================================

/// JSON type of a tool parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// Free text
    String,
    /// Floating point number
    Number,
    /// Whole number
    Integer,
}

impl ParamKind {
    fn schema_type(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
        }
    }
}

/// One parameter of a tool
#[derive(Clone, Copy, Debug)]
pub struct ParamSpec {
    /// Parameter name
    pub name: &'static str,
    /// JSON type
    pub kind: ParamKind,
    /// Shown to the model
    pub description: &'static str,
    /// Whether the model must supply it
    pub required: bool,
}

/// A tool exposed to the conversational layer
#[derive(Clone, Copy, Debug)]
pub struct ToolSpec {
    /// Function name
    pub name: &'static str,
    /// Shown to the model
    pub description: &'static str,
    /// Parameters in positional order
    pub params: &'static [ParamSpec],
}

const fn param(
    name: &'static str,
    kind: ParamKind,
    description: &'static str,
    required: bool,
) -> ParamSpec {
    ParamSpec {
        name,
        kind,
        description,
        required,
    }
}

const DURATION: ParamSpec = param(
    "duration",
    ParamKind::Number,
    "Movement duration in seconds (0.1 to 3.0)",
    false,
);

/// Every tool, in registration order
pub const TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "move_head",
        description: "Turn the head to look in a direction",
        params: &[
            param(
                "direction",
                ParamKind::String,
                "One of left, right, up, down, center",
                true,
            ),
            DURATION,
        ],
    },
    ToolSpec {
        name: "move_head_precise",
        description: "Move the head to exact angles in degrees",
        params: &[
            param("roll", ParamKind::Number, "Side tilt, -30 to 30", true),
            param("pitch", ParamKind::Number, "Up/down, -30 to 30 (positive looks down)", true),
            param("yaw", ParamKind::Number, "Left/right, -45 to 45 (positive looks left)", true),
            DURATION,
        ],
    },
    ToolSpec {
        name: "move_antennas",
        description: "Set both antennas to angles in degrees",
        params: &[
            param("right_angle", ParamKind::Number, "Right antenna in degrees, -90 to 90", true),
            param("left_angle", ParamKind::Number, "Left antenna in degrees, -90 to 90", true),
            DURATION,
        ],
    },
    ToolSpec {
        name: "antenna_expression",
        description: "Express a feeling with the antennas",
        params: &[param(
            "expression",
            ParamKind::String,
            "One of neutral, alert, droopy, asymmetric, perky",
            true,
        )],
    },
    ToolSpec {
        name: "nod_yes",
        description: "Nod to agree",
        params: &[param("times", ParamKind::Integer, "Number of nods, 1 to 5", false)],
    },
    ToolSpec {
        name: "shake_no",
        description: "Shake the head to disagree",
        params: &[param("times", ParamKind::Integer, "Number of shakes, 1 to 5", false)],
    },
    ToolSpec {
        name: "tilt_head",
        description: "Tilt the head to one side, as when curious",
        params: &[
            param("direction", ParamKind::String, "left or right", true),
            param("angle", ParamKind::Number, "Tilt in degrees, 5 to 30", false),
        ],
    },
    ToolSpec {
        name: "look_at_camera",
        description: "Look straight at the person",
        params: &[],
    },
    ToolSpec {
        name: "wake_up",
        description: "Wake the robot up",
        params: &[],
    },
    ToolSpec {
        name: "go_to_sleep",
        description: "Put the robot to sleep",
        params: &[],
    },
    ToolSpec {
        name: "express_emotion",
        description: "Express an emotion with head and antennas",
        params: &[param(
            "emotion",
            ParamKind::String,
            "One of happy, sad, surprised, curious, excited, sleepy, confused, angry, love",
            true,
        )],
    },
    ToolSpec {
        name: "do_dance",
        description: "Do a little dance",
        params: &[param("style", ParamKind::String, "default, happy or silly", false)],
    },
    ToolSpec {
        name: "reset_position",
        description: "Return head and antennas to neutral",
        params: &[],
    },
];

/// Look a tool up by name
#[must_use]
pub fn find(name: &str) -> Option<&'static ToolSpec> {
    TOOLS.iter().find(|tool| tool.name == name)
}

impl ToolSpec {
    /// Function declaration in the shape conversational APIs register
    #[must_use]
    pub fn declaration(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| {
                (
                    p.name.to_string(),
                    json!({ "type": p.kind.schema_type(), "description": p.description }),
                )
            })
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "name": self.name,
            "description": self.description,
            "parameters": {
                "type": "object",
                "properties": properties,
                "required": required,
            }
        })
    }
}

/// Declarations of every tool
#[must_use]
pub fn declarations() -> Value {
    Value::Array(TOOLS.iter().map(ToolSpec::declaration).collect())
}

// =============================================================================
// Parsing
// =============================================================================

/// A tool call: function name and named arguments
#[derive(Clone, Debug, PartialEq)]
pub struct ToolCall {
    /// Function name
    pub name: String,
    /// Named arguments
    pub args: Map<String, Value>,
}

impl ToolCall {
    /// Create a call with no arguments
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Map::new(),
        }
    }

    /// Add an argument
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Parse the line form, e.g. `nod_yes times=3`
    ///
    /// # Errors
    ///
    /// Returns an error for blank lines, malformed JSON arguments and surplus
    /// positional values. Unknown tool names parse fine; [`dispatch`] reports
    /// them.
    pub fn parse_line(line: &str) -> Result<Self, ToolError> {
        let line = line.trim();
        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (line, ""),
        };
        if name.is_empty() {
            return Err(ToolError::Empty);
        }

        let mut call = Self::new(name);

        if rest.starts_with('{') {
            match serde_json::from_str::<Value>(rest) {
                Ok(Value::Object(args)) => call.args = args,
                Ok(other) => return Err(ToolError::InvalidArguments(other.to_string())),
                Err(e) => return Err(ToolError::InvalidArguments(e.to_string())),
            }
            return Ok(call);
        }

        let positional = find(name).map_or(&[][..], |tool| tool.params);
        let mut next_position = 0;

        for token in rest.split_whitespace() {
            if let Some((key, value)) = token.split_once('=') {
                call.args.insert(key.to_string(), scalar(value));
                continue;
            }

            // Skip parameters already set by name
            while positional
                .get(next_position)
                .is_some_and(|p| call.args.contains_key(p.name))
            {
                next_position += 1;
            }
            let Some(spec) = positional.get(next_position) else {
                return Err(ToolError::TooManyArguments {
                    tool: name.to_string(),
                    value: token.to_string(),
                });
            };
            call.args.insert(spec.name.to_string(), scalar(token));
            next_position += 1;
        }

        Ok(call)
    }
}

/// Interpret a bare token as the most specific JSON scalar it spells
fn scalar(token: &str) -> Value {
    if let Ok(n) = token.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(x) = token.parse::<f64>() {
        if x.is_finite() {
            return Value::from(x);
        }
    }
    Value::from(token)
}

// =============================================================================
// Dispatch
// =============================================================================

struct Args<'a> {
    tool: &'a str,
    map: &'a Map<String, Value>,
}

impl Args<'_> {
    fn text(&self, key: &str) -> Option<&str> {
        match self.map.get(key)? {
            Value::String(s) => Some(s.as_str()),
            other => {
                warn!(tool = self.tool, key, value = %other, "Expected a string, ignoring");
                None
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn number(&self, key: &str) -> Option<f32> {
        let value = self.map.get(key)?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            warn!(tool = self.tool, key, value = %value, "Expected a number, ignoring");
        }
        parsed.map(|x| x as f32)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn integer(&self, key: &str) -> Option<i64> {
        let value = self.map.get(key)?;
        let parsed = match value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|x| x.round() as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        if parsed.is_none() {
            warn!(tool = self.tool, key, value = %value, "Expected an integer, ignoring");
        }
        parsed
    }
}

/// Run a tool call against the controller
///
/// Missing or mistyped arguments take their defaults. Unknown tools are
/// reported in the returned status.
pub async fn dispatch(controller: &MotionController, name: &str, args: &Map<String, Value>) -> String {
    let a = Args { tool: name, map: args };

    match name {
        "move_head" => {
            controller
                .move_head(a.text("direction").unwrap_or("center"), a.number("duration"))
                .await
        }
        "move_head_precise" => {
            controller
                .move_head_precise(
                    a.number("roll").unwrap_or(0.0),
                    a.number("pitch").unwrap_or(0.0),
                    a.number("yaw").unwrap_or(0.0),
                    a.number("duration"),
                )
                .await
        }
        "move_antennas" => {
            controller
                .move_antennas(
                    a.number("right_angle").or_else(|| a.number("right")).unwrap_or(0.0),
                    a.number("left_angle").or_else(|| a.number("left")).unwrap_or(0.0),
                    a.number("duration"),
                )
                .await
        }
        "antenna_expression" => {
            controller
                .antenna_expression(a.text("expression").unwrap_or("neutral"))
                .await
        }
        "nod_yes" => controller.nod_yes(a.integer("times")).await,
        "shake_no" => controller.shake_no(a.integer("times")).await,
        "tilt_head" => {
            controller
                .tilt_head(a.text("direction").unwrap_or("right"), a.number("angle"))
                .await
        }
        "look_at_camera" => controller.look_at_camera().await,
        "wake_up" => controller.wake_up().await,
        "go_to_sleep" => controller.go_to_sleep().await,
        "express_emotion" => {
            controller
                .express_emotion(a.text("emotion").unwrap_or("neutral"))
                .await
        }
        "do_dance" => controller.do_dance(a.text("style").unwrap_or("default")).await,
        "reset_position" => controller.reset_position().await,
        _ => {
            warn!(tool = name, "Unknown tool");
            format!("Unknown tool: {name}")
        }
    }
}

/// Run a parsed [`ToolCall`]
pub async fn dispatch_call(controller: &MotionController, call: &ToolCall) -> String {
    dispatch(controller, &call.name, &call.args).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::MotionSettings;
    use crate::pose::Orientation;
    use crate::test_utils::MockActuator;

    fn controller() -> (Arc<MockActuator>, MotionController) {
        let actuator = Arc::new(MockActuator::new());
        let controller = MotionController::new(actuator.clone(), MotionSettings::default());
        (actuator, controller)
    }

    #[test]
    fn test_parse_named_args() {
        let call = ToolCall::parse_line("nod_yes times=3").unwrap();
        assert_eq!(call, ToolCall::new("nod_yes").with_arg("times", 3));
    }

    #[test]
    fn test_parse_positional_args() {
        let call = ToolCall::parse_line("  move_head left 1.5 ").unwrap();
        assert_eq!(
            call,
            ToolCall::new("move_head")
                .with_arg("direction", "left")
                .with_arg("duration", 1.5)
        );
    }

    #[test]
    fn test_parse_mixed_args() {
        let call = ToolCall::parse_line("move_head_precise yaw=10 5 -5").unwrap();
        assert_eq!(call.args.get("roll"), Some(&Value::from(5)));
        assert_eq!(call.args.get("pitch"), Some(&Value::from(-5)));
        assert_eq!(call.args.get("yaw"), Some(&Value::from(10)));
    }

    #[test]
    fn test_parse_json_args() {
        let call =
            ToolCall::parse_line(r#"move_antennas {"right_angle": 45, "left_angle": -45}"#).unwrap();
        assert_eq!(call.args.get("right_angle"), Some(&Value::from(45)));

        let err = ToolCall::parse_line("move_antennas {nope").unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(ToolCall::parse_line("   "), Err(ToolError::Empty));
        assert!(matches!(
            ToolCall::parse_line("look_at_camera now"),
            Err(ToolError::TooManyArguments { .. })
        ));
    }

    #[test]
    fn test_declarations_cover_every_tool() {
        let declarations = declarations();
        let names: Vec<&str> = declarations
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        assert_eq!(names.len(), 13);
        assert!(names.contains(&"express_emotion"));

        let precise = find("move_head_precise").unwrap().declaration();
        assert_eq!(precise["parameters"]["required"], json!(["roll", "pitch", "yaw"]));
        assert_eq!(
            precise["parameters"]["properties"]["duration"]["type"],
            json!("number")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_with_defaults() {
        let (actuator, controller) = controller();

        let call = ToolCall::parse_line("nod_yes").unwrap();
        assert_eq!(dispatch_call(&controller, &call).await, "Nodded yes 2 times");

        let call = ToolCall::parse_line("tilt_head left").unwrap();
        assert_eq!(dispatch_call(&controller, &call).await, "Tilted head left");
        let last = *actuator.moves().last().unwrap();
        assert_eq!(last.head().unwrap().orientation(), Orientation::roll(20.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_coerces_strings() {
        let (actuator, controller) = controller();
        let args = ToolCall::new("move_head_precise")
            .with_arg("roll", "12")
            .with_arg("yaw", "not a number")
            .args;

        let status = dispatch(&controller, "move_head_precise", &args).await;
        assert_eq!(status, "Moved head to roll=12, pitch=0, yaw=0");
        assert_eq!(actuator.moves().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_move_antennas_angle_names() {
        let (actuator, controller) = controller();

        let args = ToolCall::new("move_antennas")
            .with_arg("right_angle", 45)
            .with_arg("left_angle", -45)
            .args;
        let status = dispatch(&controller, "move_antennas", &args).await;
        assert_eq!(status, "Moved antennas to right=45, left=-45 degrees");
        let antennas = actuator.moves()[0].antennas().unwrap();
        assert!((antennas.right - 45.0_f32.to_radians()).abs() < 1e-6);
        assert!((antennas.left + 45.0_f32.to_radians()).abs() < 1e-6);

        // Short names still work
        let call = ToolCall::parse_line("move_antennas right=30 left=-30").unwrap();
        assert_eq!(
            dispatch_call(&controller, &call).await,
            "Moved antennas to right=30, left=-30 degrees"
        );

        // Positional values fill the declared names
        let call = ToolCall::parse_line("move_antennas 10 20").unwrap();
        assert_eq!(call.args.get("left_angle"), Some(&Value::from(20)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_tool() {
        let (actuator, controller) = controller();
        let status = dispatch(&controller, "juggle", &Map::new()).await;
        assert_eq!(status, "Unknown tool: juggle");
        assert!(actuator.moves().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_declared_tool_dispatches() {
        let (_actuator, controller) = controller();
        for tool in TOOLS {
            let status = dispatch(&controller, tool.name, &Map::new()).await;
            assert!(!status.starts_with("Unknown tool"), "{} not wired", tool.name);
        }
    }
}

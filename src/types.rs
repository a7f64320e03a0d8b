//! Core data types for stage plot diagrams.
//!
//! This module defines the placed symbols (microphones, instruments, monitor wedges),
//! their kind-specific metadata and the [`Diagram`] document that is persisted as JSON.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a placed symbol.
pub type SymbolId = String;

/// Generates a fresh symbol identifier.
pub fn new_symbol_id() -> SymbolId {
    Uuid::new_v4().simple().to_string()
}

/// Color of a microphone marker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum MicColor {
    /// Blue
    Azul,
    /// Red
    Rojo,
    /// Green
    Verde,
    /// Yellow
    Amarillo,
    /// Black
    #[default]
    Negro,
    /// White
    Blanco,
}

impl MicColor {
    /// All colors in the order the creation dialog offers them.
    pub const ALL: [MicColor; 6] = [
        MicColor::Negro,
        MicColor::Verde,
        MicColor::Rojo,
        MicColor::Blanco,
        MicColor::Azul,
        MicColor::Amarillo,
    ];

    /// Display name, identical to the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            MicColor::Azul => "Azul",
            MicColor::Rojo => "Rojo",
            MicColor::Verde => "Verde",
            MicColor::Amarillo => "Amarillo",
            MicColor::Negro => "Negro",
            MicColor::Blanco => "Blanco",
        }
    }

    /// Fill color as an RGB triple.
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            MicColor::Azul => (0x25, 0x63, 0xeb),
            MicColor::Rojo => (0xef, 0x44, 0x44),
            MicColor::Verde => (0x22, 0xc5, 0x5e),
            MicColor::Amarillo => (0xea, 0xb3, 0x08),
            MicColor::Negro => (0x11, 0x18, 0x27),
            MicColor::Blanco => (0xf9, 0xfa, 0xfb),
        }
    }
}

/// Instrument placed on stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentType {
    /// Drum kit
    #[default]
    Bateria,
    /// Electric guitar
    Guitarra,
    /// Acoustic guitar
    GuitarraAcustica,
    /// Piano / keys
    Piano,
    /// Bass
    Bajo,
    /// Peruvian cajón
    CajonPeruano,
}

impl InstrumentType {
    /// All instrument types in catalog order.
    pub const ALL: [InstrumentType; 6] = [
        InstrumentType::Bateria,
        InstrumentType::Guitarra,
        InstrumentType::GuitarraAcustica,
        InstrumentType::Piano,
        InstrumentType::Bajo,
        InstrumentType::CajonPeruano,
    ];

    /// Emoji drawn inside the instrument box.
    pub fn emoji(self) -> &'static str {
        match self {
            InstrumentType::Bateria => "🥁",
            InstrumentType::Guitarra => "🎸",
            InstrumentType::GuitarraAcustica => "🎻",
            InstrumentType::Piano => "🎹",
            InstrumentType::Bajo => "🎵",
            InstrumentType::CajonPeruano => "🪘",
        }
    }

    /// Human readable label drawn below the box.
    pub fn label(self) -> &'static str {
        match self {
            InstrumentType::Bateria => "Batería",
            InstrumentType::Guitarra => "Guitarra",
            InstrumentType::GuitarraAcustica => "Guitarra acústica",
            InstrumentType::Piano => "Piano",
            InstrumentType::Bajo => "Bajo",
            InstrumentType::CajonPeruano => "Cajón peruano",
        }
    }
}

/// Output group a monitor wedge is fed from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum MonitorGroup {
    /// Outputs 1-2
    #[default]
    #[serde(rename = "1-2")]
    G12,
    /// Outputs 3-4
    #[serde(rename = "3-4")]
    G34,
    /// Outputs 5-6
    #[serde(rename = "5-6")]
    G56,
    /// Outputs 7-8
    #[serde(rename = "7-8")]
    G78,
}

impl MonitorGroup {
    /// All groups in order.
    pub const ALL: [MonitorGroup; 4] = [
        MonitorGroup::G12,
        MonitorGroup::G34,
        MonitorGroup::G56,
        MonitorGroup::G78,
    ];

    /// Display name, identical to the serialized form.
    pub fn name(self) -> &'static str {
        match self {
            MonitorGroup::G12 => "1-2",
            MonitorGroup::G34 => "3-4",
            MonitorGroup::G56 => "5-6",
            MonitorGroup::G78 => "7-8",
        }
    }
}

/// Metadata of a microphone symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MicProps {
    /// Marker color
    pub color: MicColor,
    /// Person assigned to the microphone
    pub name: String,
    /// Console channel label
    pub channel: String,
}

/// Metadata of an instrument symbol.
///
/// `emoji` and `label` are derived from `instrument` but stored alongside it so the
/// persisted document is self-describing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InstrumentProps {
    /// Instrument type
    pub instrument: InstrumentType,
    /// Console channel label
    pub channel: String,
    /// Emoji shown inside the box
    pub emoji: String,
    /// Label shown below the box
    pub label: String,
}

impl InstrumentProps {
    /// Builds instrument metadata, deriving emoji and label from the catalog.
    pub fn new(instrument: InstrumentType, channel: impl Into<String>) -> Self {
        Self {
            instrument,
            channel: channel.into(),
            emoji: instrument.emoji().to_string(),
            label: instrument.label().to_string(),
        }
    }
}

/// Metadata of a monitor wedge symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorProps {
    /// Monitor number, at least 1
    pub number: u32,
    /// Output group feeding the wedge
    pub group: MonitorGroup,
    /// Console channel label
    pub channel: String,
}

/// Kind-specific metadata of a symbol. The serialized `kind` tag selects the variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SymbolProps {
    /// A microphone
    Mic(MicProps),
    /// An instrument
    Instrument(InstrumentProps),
    /// A monitor wedge
    Monitor(MonitorProps),
}

/// The three symbol kinds, without metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Microphone
    Mic,
    /// Instrument
    Instrument,
    /// Monitor wedge
    Monitor,
}

impl SymbolProps {
    /// Kind of this metadata payload.
    pub fn kind(&self) -> SymbolKind {
        match self {
            SymbolProps::Mic(_) => SymbolKind::Mic,
            SymbolProps::Instrument(_) => SymbolKind::Instrument,
            SymbolProps::Monitor(_) => SymbolKind::Monitor,
        }
    }

    /// Channel label, common to all kinds.
    pub fn channel(&self) -> &str {
        match self {
            SymbolProps::Mic(m) => &m.channel,
            SymbolProps::Instrument(i) => &i.channel,
            SymbolProps::Monitor(m) => &m.channel,
        }
    }

    /// Primary caption drawn below the symbol.
    pub fn caption(&self) -> String {
        match self {
            SymbolProps::Mic(m) => format!("mic {}", m.name).trim().to_string(),
            SymbolProps::Instrument(i) => i.label.clone(),
            SymbolProps::Monitor(m) => format!("MON {} · G{}", m.number, m.group.name()),
        }
    }

    /// Validates caller-supplied metadata the way the creation dialogs do:
    /// the channel must be non-blank, and monitor numbers start at 1.
    pub fn validate(&self) -> Result<(), String> {
        if self.channel().trim().is_empty() {
            return Err("Channel must not be empty".to_string());
        }
        if let SymbolProps::Monitor(m) = self {
            if m.number < 1 {
                return Err("Monitor number must be at least 1".to_string());
            }
        }
        Ok(())
    }
}

/// A placed diagram element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symbol {
    /// Unique identifier within the diagram
    pub id: SymbolId,
    /// World-space x coordinate
    pub x: f64,
    /// World-space y coordinate
    pub y: f64,
    /// Kind-specific metadata (flattened next to `id`, `x`, `y` with a `kind` tag)
    #[serde(flatten)]
    pub props: SymbolProps,
}

impl Symbol {
    /// Creates a symbol with a fresh identifier at the given world position.
    pub fn new(props: SymbolProps, x: f64, y: f64) -> Self {
        Self {
            id: new_symbol_id(),
            x,
            y,
            props,
        }
    }

    /// Kind of the symbol.
    pub fn kind(&self) -> SymbolKind {
        self.props.kind()
    }
}

/// Visual theme of a diagram.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Light background
    Light,
    /// Dark background
    #[default]
    Dark,
}

impl DisplayMode {
    /// The other mode.
    pub fn toggled(self) -> Self {
        match self {
            DisplayMode::Light => DisplayMode::Dark,
            DisplayMode::Dark => DisplayMode::Light,
        }
    }
}

/// A stage plot: the symbol list plus the display mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Diagram {
    /// Placed symbols; order is irrelevant except for drawing order
    #[serde(default)]
    pub nodes: Vec<Symbol>,
    /// Display theme. Older documents call this field `theme`.
    #[serde(default, alias = "theme")]
    pub mode: DisplayMode,
}

impl Diagram {
    /// Creates an empty diagram in the default (dark) mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize the diagram to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a diagram from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Looks up a symbol by id.
    pub fn symbol(&self, id: &str) -> Option<&Symbol> {
        self.nodes.iter().find(|s| s.id == id)
    }

    /// Looks up a symbol by id for mutation.
    pub fn symbol_mut(&mut self, id: &str) -> Option<&mut Symbol> {
        self.nodes.iter_mut().find(|s| s.id == id)
    }

    /// Removes a symbol, returning it if it existed.
    pub fn remove(&mut self, id: &str) -> Option<Symbol> {
        let index = self.nodes.iter().position(|s| s.id == id)?;
        Some(self.nodes.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_instrument_props_derive_catalog_entry() {
        let props = InstrumentProps::new(InstrumentType::CajonPeruano, "7");
        assert_eq!(props.emoji, "🪘");
        assert_eq!(props.label, "Cajón peruano");
        assert_eq!(props.channel, "7");
    }

    #[test]
    fn test_symbol_ids_are_unique() {
        let a = Symbol::new(SymbolProps::Mic(MicProps::default()), 0.0, 0.0);
        let b = Symbol::new(SymbolProps::Mic(MicProps::default()), 0.0, 0.0);
        assert_ne!(a.id, b.id);
        assert!(!a.id.is_empty());
    }

    #[test]
    fn test_mic_wire_shape() {
        let symbol = Symbol {
            id: "abc".into(),
            x: 10.5,
            y: -3.0,
            props: SymbolProps::Mic(MicProps {
                color: MicColor::Negro,
                name: "Juan".into(),
                channel: "1".into(),
            }),
        };
        let value = serde_json::to_value(&symbol).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "abc", "kind": "mic", "x": 10.5, "y": -3.0,
                "color": "Negro", "name": "Juan", "channel": "1"
            })
        );
    }

    #[test]
    fn test_instrument_and_monitor_wire_shape() {
        let value = json!({
            "nodes": [
                {"id": "i1", "kind": "instrument", "x": 1, "y": 2,
                 "instrument": "guitarra_acustica", "channel": "5",
                 "emoji": "🎻", "label": "Guitarra acústica"},
                {"id": "m1", "kind": "monitor", "x": 3.25, "y": 4,
                 "number": 2, "group": "5-6", "channel": "Aux 3"}
            ],
            "mode": "light"
        });
        let diagram: Diagram = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(diagram.mode, DisplayMode::Light);
        assert_eq!(diagram.nodes.len(), 2);
        match &diagram.nodes[1].props {
            SymbolProps::Monitor(m) => {
                assert_eq!(m.number, 2);
                assert_eq!(m.group, MonitorGroup::G56);
            }
            other => panic!("Expected monitor, got {:?}", other),
        }
        assert_eq!(diagram.nodes[0].kind(), SymbolKind::Instrument);

        let back = serde_json::to_value(&diagram).unwrap();
        assert_eq!(back["nodes"][1]["group"], "5-6");
        assert_eq!(back["nodes"][0]["instrument"], "guitarra_acustica");
        assert_eq!(back["nodes"][1]["x"], 3.25);
    }

    #[test]
    fn test_mode_defaults_to_dark_and_accepts_theme_key() {
        let diagram = Diagram::from_json(r#"{"nodes": []}"#).unwrap();
        assert_eq!(diagram.mode, DisplayMode::Dark);

        let legacy = Diagram::from_json(r#"{"nodes": [], "theme": "light"}"#).unwrap();
        assert_eq!(legacy.mode, DisplayMode::Light);
    }

    #[test]
    fn test_captions() {
        let mic = SymbolProps::Mic(MicProps {
            color: MicColor::Azul,
            name: String::new(),
            channel: "2".into(),
        });
        assert_eq!(mic.caption(), "mic");

        let monitor = SymbolProps::Monitor(MonitorProps {
            number: 3,
            group: MonitorGroup::G78,
            channel: "Aux".into(),
        });
        assert_eq!(monitor.caption(), "MON 3 · G7-8");
    }

    #[test]
    fn test_validate_rejects_blank_channel_and_zero_monitor() {
        let blank = SymbolProps::Instrument(InstrumentProps::new(InstrumentType::Piano, "  "));
        assert!(blank.validate().is_err());

        let zero = SymbolProps::Monitor(MonitorProps {
            number: 0,
            group: MonitorGroup::G12,
            channel: "1".into(),
        });
        assert!(zero.validate().is_err());

        let ok = SymbolProps::Mic(MicProps {
            color: MicColor::Rojo,
            name: "Ana".into(),
            channel: "3".into(),
        });
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_diagram_remove() {
        let mut diagram = Diagram::new();
        let s = Symbol::new(SymbolProps::Mic(MicProps::default()), 1.0, 2.0);
        let id = s.id.clone();
        diagram.nodes.push(s);

        assert!(diagram.symbol(&id).is_some());
        assert!(diagram.remove("missing").is_none());
        assert_eq!(diagram.remove(&id).map(|s| s.id), Some(id));
        assert!(diagram.nodes.is_empty());
    }
}

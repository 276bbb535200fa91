use serde::{de::DeserializeOwned, de::SeqAccess, Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LottieJson {
    pub v: Option<String>,
    #[serde(default)]
    pub nm: Option<String>,
    pub ip: f32,
    pub op: f32,
    pub fr: f32,
    pub w: u32,
    pub h: u32,
    pub layers: Vec<Layer>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Layer {
    #[serde(default)]
    pub ty: u8, // 4 = shape layer
    #[serde(default)]
    pub ind: Option<u32>,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub ip: f32,
    #[serde(default)]
    pub op: f32,
    #[serde(default)]
    pub hd: Option<bool>, // Hidden - if true, layer should not be rendered
    #[serde(default)]
    pub shapes: Option<Vec<Shape>>, // Shape Layer
}

// Shapes

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "ty")]
pub enum Shape {
    #[serde(rename = "gr")]
    Group(GroupShape),
    #[serde(rename = "rc")]
    Rect(RectShape),
    #[serde(rename = "el")]
    Ellipse(EllipseShape),
    #[serde(rename = "sh")]
    Path(PathShape),
    #[serde(rename = "tm")]
    Trim(TrimShape),
    #[serde(rename = "sr")]
    Polystar(PolystarShape),
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroupShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub it: Vec<Shape>,
    #[serde(default)]
    pub hd: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PolystarShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub p: PositionProperty,
    pub or: Property<f32>,
    #[serde(default)]
    pub os: Property<f32>,
    #[serde(default)]
    pub r: Property<f32>,
    pub pt: Property<f32>,
    #[serde(default)]
    pub sy: u8, // 1 = star, 2 = polygon
    #[serde(default)]
    pub ir: Option<Property<f32>>,
    #[serde(default)]
    pub is: Option<Property<f32>>,
    #[serde(default)]
    pub d: Option<u8>, // Direction, 3 = reversed
    #[serde(default)]
    pub hd: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RectShape {
    #[serde(default)]
    pub nm: Option<String>,
    pub s: Property<Point2>,
    #[serde(default)]
    pub p: PositionProperty,
    #[serde(default)]
    pub r: Property<f32>,
    #[serde(default)]
    pub hd: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EllipseShape {
    #[serde(default)]
    pub nm: Option<String>,
    pub s: Property<Point2>,
    #[serde(default)]
    pub p: PositionProperty,
    #[serde(default)]
    pub d: Option<u8>,
    #[serde(default)]
    pub hd: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathShape {
    #[serde(default)]
    pub nm: Option<String>,
    pub ks: Property<BezierPath>,
    #[serde(default)]
    pub hd: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrimShape {
    #[serde(default)]
    pub nm: Option<String>,
    pub s: Property<f32>,
    pub e: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub m: u8, // 1 = simultaneously, 2 = individually
    #[serde(default)]
    pub hd: Option<bool>,
}

/// Position of a shape, either one animated point or two independently
/// animated coordinates (`"s": true`).
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum PositionProperty {
    Split {
        x: Property<f32>,
        y: Property<f32>,
    },
    Unified(Property<Point2>),
}

impl Default for PositionProperty {
    fn default() -> Self {
        PositionProperty::Unified(Property::default())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Property<T> {
    #[serde(default)]
    pub a: u8,
    #[serde(default)]
    #[serde(bound(deserialize = "T: DeserializeOwned"))]
    pub k: Value<T>,
    #[serde(default)]
    pub ix: Option<u32>,
    #[serde(default)]
    pub x: Option<String>,
}

impl<T> Property<T> {
    pub fn fixed(value: T) -> Self {
        Property {
            a: 0,
            k: Value::Static(value),
            ix: None,
            x: None,
        }
    }

    pub fn animated(keyframes: Vec<Keyframe<T>>) -> Self {
        Property {
            a: 1,
            k: Value::Animated(keyframes),
            ix: None,
            x: None,
        }
    }
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Property {
            a: 0,
            k: Value::Default,
            ix: None,
            x: None,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub enum Value<T> {
    Default,
    Static(T),
    Animated(Vec<Keyframe<T>>),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;

        if v.is_null() {
            return Ok(Value::Default);
        }

        if let Ok(keyframes) = serde_json::from_value::<Vec<Keyframe<T>>>(v.clone()) {
            return Ok(Value::Animated(keyframes));
        }

        if let Ok(val) = serde_json::from_value::<T>(v.clone()) {
            return Ok(Value::Static(val));
        }

        if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
            if let Some(first) = vec.into_iter().next() {
                return Ok(Value::Static(first));
            }
        }

        Ok(Value::Default)
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Default
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Keyframe<T> {
    pub t: f32,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub s: Option<T>,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub e: Option<T>,
    #[serde(default)]
    pub i: Option<BezierTangent>,
    #[serde(default)]
    pub o: Option<BezierTangent>,
    #[serde(default)]
    pub to: Option<Vec<f32>>,
    #[serde(default)]
    pub ti: Option<Vec<f32>>,
    #[serde(default)]
    pub h: Option<u8>,
}

impl<T> Keyframe<T> {
    /// Linear keyframe starting at `t` with value `s`.
    pub fn linear(t: f32, s: T) -> Self {
        Keyframe {
            t,
            s: Some(s),
            e: None,
            i: None,
            o: None,
            to: None,
            ti: None,
            h: None,
        }
    }
}

fn deserialize_keyframe_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    if v.is_null() {
        return Ok(None);
    }

    if let Ok(val) = serde_json::from_value(v.clone()) {
        return Ok(Some(val));
    }

    if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
        if let Some(first) = vec.into_iter().next() {
            return Ok(Some(first));
        }
    }

    Ok(None)
}

pub type Vec2 = [f32; 2];

/// Bezier tangent control points for keyframe easing
/// Matches the JSON format: {"x": [0.48], "y": [1]}
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BezierTangent {
    pub x: Vec<f32>,
    pub y: Vec<f32>,
}

// 2D point that also accepts a trailing z component, which is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct Point2(pub Vec2);

impl<'de> Deserialize<'de> for Point2 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct Point2Visitor;
        impl<'de> serde::de::Visitor<'de> for Point2Visitor {
            type Value = Point2;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of 2 or 3 floats")
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let x = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(0, &self))?;
                let y = seq
                    .next_element()?
                    .ok_or_else(|| serde::de::Error::invalid_length(1, &self))?;
                while seq.next_element::<f32>()?.is_some() {}
                Ok(Point2([x, y]))
            }
        }
        deserializer.deserialize_seq(Point2Visitor)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BezierPath {
    #[serde(default)]
    pub c: bool,
    #[serde(default)]
    pub i: Vec<Vec2>,
    #[serde(default)]
    pub o: Vec<Vec2>,
    #[serde(default)]
    pub v: Vec<Vec2>,
}

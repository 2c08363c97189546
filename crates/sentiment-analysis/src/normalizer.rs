//! Record Normalizer
//!
//! Converts loosely shaped key phrases and aspects into the fixed structures
//! the report view renders. Key phrases arrive either as bare strings or as
//! objects; aspects arrive as objects whose field names vary by producer.

use rand::Rng;
use report_core::{NormalizedAspect, NormalizedKeyPhrase, Sentiment, UNKNOWN_ASPECT};
use serde_json::{Map, Value};

/// Synthesized confidence range for aspects that arrive without one
const SYNTHETIC_CONFIDENCE: std::ops::Range<u8> = 60..80;

/// Normalize raw key phrases. Entries whose text resolves to empty are
/// dropped, so the output may be shorter than the input but never longer.
pub fn normalize_key_phrases(items: &[Value]) -> Vec<NormalizedKeyPhrase> {
    let phrases: Vec<NormalizedKeyPhrase> =
        items.iter().filter_map(normalize_key_phrase).collect();

    if phrases.len() < items.len() {
        tracing::debug!(
            "Dropped {} key phrases with empty text",
            items.len() - phrases.len()
        );
    }

    phrases
}

fn normalize_key_phrase(item: &Value) -> Option<NormalizedKeyPhrase> {
    let (text, value, sentiment) = match item {
        Value::String(s) => (s.trim().to_string(), 1.0, Sentiment::Neutral),
        Value::Number(n) => (n.to_string(), 1.0, Sentiment::Neutral),
        Value::Object(map) => (
            string_field(map, &["text", "word"]).unwrap_or_default(),
            number_field(map, &["value", "count"]).unwrap_or(1.0),
            map.get("sentiment").map(sentiment_of).unwrap_or_default(),
        ),
        _ => return None,
    };

    if text.is_empty() {
        return None;
    }

    Some(NormalizedKeyPhrase {
        text,
        value,
        sentiment,
    })
}

/// Normalize raw aspects using the thread-local RNG for missing confidence.
/// Output is 1:1 with input.
pub fn normalize_aspects(items: &[Value]) -> Vec<NormalizedAspect> {
    let mut rng = rand::thread_rng();
    normalize_aspects_with_rng(items, &mut rng)
}

/// Same as [`normalize_aspects`] with a caller-supplied RNG
pub fn normalize_aspects_with_rng<R: Rng>(
    items: &[Value],
    rng: &mut R,
) -> Vec<NormalizedAspect> {
    items.iter().map(|item| normalize_aspect(item, rng)).collect()
}

fn normalize_aspect<R: Rng>(item: &Value, rng: &mut R) -> NormalizedAspect {
    let empty = Map::new();
    let (map, bare_name) = match item {
        Value::Object(map) => (map, None),
        Value::String(s) => (&empty, Some(s.trim().to_string())),
        _ => (&empty, None),
    };

    let aspect = string_field(map, &["aspect", "name"])
        .or(bare_name.filter(|s| !s.is_empty()))
        .unwrap_or_else(|| UNKNOWN_ASPECT.to_string());

    let confidence = match number_field(map, &["confidence"]) {
        Some(c) => c.round().clamp(0.0, 100.0) as u8,
        None => rng.gen_range(SYNTHETIC_CONFIDENCE),
    };

    NormalizedAspect {
        aspect,
        sentiment: map.get("sentiment").map(sentiment_of).unwrap_or_default(),
        confidence,
        context: string_field(map, &["context"]).unwrap_or_default(),
        positive: number_field(map, &["positive"]),
        neutral: number_field(map, &["neutral"]),
        negative: number_field(map, &["negative"]),
    }
}

/// Resolve a sentiment signal: a bare label, or an object carrying `label`
/// (or `sentiment`). Anything else is neutral.
pub fn sentiment_of(value: &Value) -> Sentiment {
    match value {
        Value::String(label) => Sentiment::from_label(label),
        Value::Object(map) => map
            .get("label")
            .or_else(|| map.get("sentiment"))
            .and_then(Value::as_str)
            .map(Sentiment::from_label)
            .unwrap_or_default(),
        _ => Sentiment::Neutral,
    }
}

/// First non-empty string among `keys`, trimmed
fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| map.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

/// First numeric value among `keys`; numeric strings are accepted
fn number_field(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| match map.get(*k)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::json;

    #[test]
    fn test_key_phrases_mixed_input() {
        let items = vec![
            json!("fast delivery"),
            json!({"text": "great price", "value": 4, "sentiment": "positive"}),
            json!({"word": "late", "sentiment": "negative"}),
            json!({"value": 3}),
            json!(""),
            json!({"text": "   "}),
            json!(null),
        ];

        let phrases = normalize_key_phrases(&items);
        assert_eq!(phrases.len(), 3);
        assert!(phrases.iter().all(|p| !p.text.is_empty()));

        assert_eq!(phrases[0].text, "fast delivery");
        assert_eq!(phrases[0].value, 1.0);
        assert_eq!(phrases[0].sentiment, Sentiment::Neutral);

        assert_eq!(phrases[1].value, 4.0);
        assert_eq!(phrases[1].sentiment, Sentiment::Positive);

        assert_eq!(phrases[2].text, "late");
        assert_eq!(phrases[2].value, 1.0);
        assert_eq!(phrases[2].sentiment, Sentiment::Negative);
    }

    #[test]
    fn test_key_phrases_never_grow() {
        let items: Vec<Value> = (0..20)
            .map(|i| if i % 3 == 0 { json!({}) } else { json!(format!("phrase {}", i)) })
            .collect();
        let phrases = normalize_key_phrases(&items);
        assert!(phrases.len() <= items.len());
        assert_eq!(phrases.len(), 13);
    }

    #[test]
    fn test_aspect_defaults() {
        let mut rng = StdRng::seed_from_u64(7);
        let aspects = normalize_aspects_with_rng(&[json!({})], &mut rng);

        assert_eq!(aspects.len(), 1);
        let a = &aspects[0];
        assert_eq!(a.aspect, "Unknown");
        assert_eq!(a.sentiment, Sentiment::Neutral);
        assert!((60..80).contains(&a.confidence));
        assert_eq!(a.context, "");
        assert_eq!(a.positive, None);
        assert_eq!(a.negative, None);
    }

    #[test]
    fn test_aspect_name_fallback_chain() {
        let items = vec![
            json!({"aspect": "Shipping", "name": "ignored"}),
            json!({"name": "Support"}),
            json!({"aspect": "", "name": "Price"}),
            json!("Packaging"),
            json!(42),
        ];
        let names: Vec<String> = normalize_aspects(&items)
            .into_iter()
            .map(|a| a.aspect)
            .collect();
        assert_eq!(names, vec!["Shipping", "Support", "Price", "Packaging", "Unknown"]);
    }

    #[test]
    fn test_aspect_cardinality_and_confidence() {
        let items: Vec<Value> = (0..50)
            .map(|i| {
                if i % 2 == 0 {
                    json!({"aspect": format!("a{}", i)})
                } else {
                    json!({"aspect": format!("a{}", i), "confidence": 91.6})
                }
            })
            .collect();

        let aspects = normalize_aspects(&items);
        assert_eq!(aspects.len(), items.len());
        for (i, a) in aspects.iter().enumerate() {
            if i % 2 == 0 {
                assert!((60..80).contains(&a.confidence));
            } else {
                assert_eq!(a.confidence, 92);
            }
        }
    }

    #[test]
    fn test_aspect_percentages_pass_through() {
        let aspects = normalize_aspects(&[json!({
            "aspect": "Quality",
            "sentiment": "Positive",
            "context": "build quality",
            "positive": 72.5,
            "neutral": 20,
            "negative": 7.5,
            "confidence": 88
        })]);

        let a = &aspects[0];
        assert_eq!(a.sentiment, Sentiment::Positive);
        assert_eq!(a.context, "build quality");
        assert_eq!(a.positive, Some(72.5));
        assert_eq!(a.neutral, Some(20.0));
        assert_eq!(a.negative, Some(7.5));
        assert_eq!(a.confidence, 88);
    }

    #[test]
    fn test_sentiment_of_shapes() {
        assert_eq!(sentiment_of(&json!("negative")), Sentiment::Negative);
        assert_eq!(sentiment_of(&json!({"label": "positive", "score": 0.9})), Sentiment::Positive);
        assert_eq!(sentiment_of(&json!({"score": 0.9})), Sentiment::Neutral);
        assert_eq!(sentiment_of(&json!(0.4)), Sentiment::Neutral);
    }
}

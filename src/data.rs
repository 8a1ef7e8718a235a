//! Graph snapshot types and loading.
//!
//! The snapshot is produced at site build time (`posts-graph.json`) and
//! fetched once per page load.

use serde::{Deserialize, Serialize};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::Response;

use crate::error::{Error, Result};

/// Path of the snapshot relative to the site base url.
pub const SNAPSHOT_PATH: &str = "/assets/data/posts-graph.json";

/// A node as emitted by the data builder.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
	/// Unique id, referenced by links.
	pub id: String,
	/// Display text.
	#[serde(default)]
	pub label: String,
	/// Builder-assigned node type (`post`, ...).
	#[serde(rename = "type", default)]
	pub kind: String,
	/// Marker radius.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub size: Option<f64>,
	/// Marker fill color.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub color: Option<String>,
	/// Page the node opens when clicked.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
}

/// A link between two node ids.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
	/// Id of the source node.
	pub source: String,
	/// Id of the target node.
	pub target: String,
	/// Relative bonding force in `0..=1`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub strength: Option<f64>,
}

/// The full snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphData {
	/// All nodes.
	#[serde(default)]
	pub nodes: Vec<GraphNode>,
	/// All links.
	#[serde(default)]
	pub links: Vec<GraphLink>,
	/// Build timestamp.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub generated: Option<String>,
	/// Number of post nodes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub post_count: Option<usize>,
}

impl GraphData {
	/// Parse a snapshot document.
	pub fn from_json(text: &str) -> Result<Self> {
		serde_json::from_str(text)
			.map_err(|e| Error::unavailable(format!("malformed snapshot: {e}")))
	}
}

/// Base url of the site, taken from `<html data-baseurl="...">`.
pub fn site_base_url() -> String {
	web_sys::window()
		.and_then(|w| w.document())
		.and_then(|d| d.document_element())
		.and_then(|el| el.get_attribute("data-baseurl"))
		.unwrap_or_default()
}

/// Fetch and parse the snapshot at `url`.
pub async fn fetch_graph_data(url: &str) -> Result<GraphData> {
	let window = web_sys::window().ok_or_else(|| Error::unavailable("no window"))?;
	let response = JsFuture::from(window.fetch_with_str(url))
		.await
		.map_err(|e| Error::unavailable(format!("fetch {url} failed: {e:?}")))?;
	let response: Response = response
		.dyn_into()
		.map_err(|_| Error::unavailable(format!("fetch {url} did not return a response")))?;
	if !response.ok() {
		return Err(Error::unavailable(format!(
			"fetch {url} returned status {}",
			response.status()
		)));
	}
	let body = response
		.text()
		.map_err(|e| Error::unavailable(format!("reading {url} failed: {e:?}")))?;
	let text = JsFuture::from(body)
		.await
		.map_err(|e| Error::unavailable(format!("reading {url} failed: {e:?}")))?
		.as_string()
		.ok_or_else(|| Error::unavailable(format!("{url} body is not text")))?;
	GraphData::from_json(&text)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ErrorKind;

	#[test]
	fn parses_builder_output() {
		let text = r##"{
			"nodes": [
				{"id": "post-a", "label": "A", "type": "post", "size": 8, "color": "#ffffff",
				 "url": "/blog/2024/01/02/a/", "tags": ["rust"], "categories": ["blog"]},
				{"id": "post-b", "label": "B", "type": "post"}
			],
			"links": [{"source": "post-a", "target": "post-b", "strength": 0.6666666666666666}],
			"generated": "2024-01-02T00:00:00.000Z",
			"postCount": 2
		}"##;
		let data = GraphData::from_json(text).unwrap();
		assert_eq!(data.nodes.len(), 2);
		assert_eq!(data.nodes[0].kind, "post");
		assert_eq!(data.nodes[0].size, Some(8.0));
		assert_eq!(data.nodes[0].url.as_deref(), Some("/blog/2024/01/02/a/"));
		assert_eq!(data.nodes[1].size, None);
		assert_eq!(data.links[0].strength, Some(0.6666666666666666));
		assert_eq!(data.post_count, Some(2));
	}

	#[test]
	fn missing_sections_default_to_empty() {
		let data = GraphData::from_json("{}").unwrap();
		assert!(data.nodes.is_empty());
		assert!(data.links.is_empty());
	}

	#[test]
	fn malformed_snapshot_is_data_unavailable() {
		let err = GraphData::from_json("<html>404</html>").unwrap_err();
		assert_eq!(err.kind(), ErrorKind::DataUnavailable);
	}
}

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{error, info};

use crate::components::force_graph::ForceGraphCanvas;
use crate::data::{GraphData, SNAPSHOT_PATH, fetch_graph_data, site_base_url};

#[derive(Clone, Debug)]
enum Snapshot {
	Loading,
	Ready(GraphData),
	Unavailable,
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let (snapshot, set_snapshot) = signal(Snapshot::Loading);

	spawn_local(async move {
		let url = format!("{}{}", site_base_url(), SNAPSHOT_PATH);
		match fetch_graph_data(&url).await {
			Ok(data) => {
				info!(
					"loaded {} nodes and {} links from {url}",
					data.nodes.len(),
					data.links.len()
				);
				set_snapshot.set(Snapshot::Ready(data));
			}
			Err(e) => {
				error!("Error loading graph data: {e}");
				set_snapshot.set(Snapshot::Unavailable);
			}
		}
	});

	view! {
		<div class="knowledge-graph">
			<div class="graph-overlay">
				<h1>"Knowledge Graph"</h1>
				<p class="subtitle">"Drag posts to rearrange. Scroll to zoom. Click a post to open it."</p>
			</div>
			{move || match snapshot.get() {
				Snapshot::Loading => view! { <p class="graph-loading">"Loading..."</p> }.into_any(),
				Snapshot::Ready(data) => {
					let data = Signal::derive(move || data.clone());
					view! { <ForceGraphCanvas data=data /> }.into_any()
				}
				Snapshot::Unavailable => {
					view! {
						<div class="graph-fallback">
							<p>"Knowledge graph data is being generated. Check back soon!"</p>
						</div>
					}
						.into_any()
				}
			}}
		</div>
	}
}

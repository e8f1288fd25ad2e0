use leptos::prelude::*;

use crate::components::mind_map::MindMapCanvas;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				<MindMapCanvas fullscreen=true />
				<div class="graph-overlay">
					<h1>"Mind Map"</h1>
					<p class="subtitle">
						"Click empty space to add a child of the highlighted node. Drag to move, shift-drag to pan. Double-click to rename."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}

//! Visual card components, capacity packing, and render backends.
//!
//! Cards are trees of [`Component`] nodes. A recursive weight over the tree
//! drives greedy order-preserving packing into capacity-bounded chunks, each
//! of which becomes one outbound message. Two render backends share the same
//! component model: the rich component-tree payload and the legacy embed
//! list.

use serde_json::{json, Value};

/// Maximum component weight per rich-component message.
pub const CHUNK_CAPACITY: usize = 40;
/// Maximum embed blocks per legacy message.
pub const MAX_EMBEDS_PER_MESSAGE: usize = 10;

const COMPONENTS_V2_FLAG: u64 = 1 << 15;
const EPHEMERAL_FLAG: u64 = 1 << 6;

const LISTING_URL_BASE: &str = "https://www.roblox.com/game-pass";

/// Closed union of the component shapes the renderers understand.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Text {
        content: String,
    },
    Separator {
        divider: bool,
        spacing: u8,
    },
    Container {
        children: Vec<Component>,
        accent_color: Option<u32>,
        accessory: Option<Box<Component>>,
    },
}

impl Component {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    pub fn separator(divider: bool, spacing: u8) -> Self {
        Self::Separator { divider, spacing }
    }

    pub fn container(children: Vec<Component>) -> Self {
        Self::Container {
            children,
            accent_color: None,
            accessory: None,
        }
    }

    /// Packing weight: 1 per node, containers add their children and any
    /// attached accessory.
    pub fn weight(&self) -> usize {
        match self {
            Self::Text { .. } | Self::Separator { .. } => 1,
            Self::Container {
                children,
                accessory,
                ..
            } => {
                1 + children.iter().map(Component::weight).sum::<usize>()
                    + accessory.as_deref().map_or(0, Component::weight)
            }
        }
    }

    /// All text content in the tree, top to bottom. Used by the embed
    /// renderer and the CLI text output.
    pub fn text_lines(&self) -> Vec<&str> {
        match self {
            Self::Text { content } => vec![content.as_str()],
            Self::Separator { .. } => Vec::new(),
            Self::Container {
                children,
                accessory,
                ..
            } => {
                let mut lines: Vec<&str> =
                    children.iter().flat_map(Component::text_lines).collect();
                if let Some(acc) = accessory.as_deref() {
                    lines.extend(acc.text_lines());
                }
                lines
            }
        }
    }
}

/// Greedy sequential packing: accumulate until the next component would
/// overflow, then start a new chunk. Oversized components get a chunk of
/// their own rather than being split. Input order is preserved because cards
/// must render in request order.
pub fn chunk_components(components: Vec<Component>, capacity: usize) -> Vec<Vec<Component>> {
    let mut chunks: Vec<Vec<Component>> = Vec::new();
    let mut current: Vec<Component> = Vec::new();
    let mut current_weight = 0;
    for component in components {
        let w = component.weight();
        if w > capacity {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_weight = 0;
            }
            chunks.push(vec![component]);
            continue;
        }
        if current_weight + w > capacity && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_weight = 0;
        }
        current_weight += w;
        current.push(component);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

// ---------------------------------------------------------------------------
// Render backends
// ---------------------------------------------------------------------------

/// Serializes component chunks into outbound message bodies.
pub trait RenderBackend: Send + Sync {
    /// Split components into groups, each renderable as one message.
    fn chunk(&self, components: Vec<Component>) -> Vec<Vec<Component>>;
    /// Render one group into a message payload.
    fn render_chunk(&self, chunk: &[Component], ephemeral: bool) -> Value;
}

/// Rich component-tree payload (type-tagged nodes, components-v2 flag).
pub struct ComponentsV2;

impl ComponentsV2 {
    fn render_component(component: &Component) -> Value {
        match component {
            Component::Text { content } => json!({"type": 10, "content": content}),
            Component::Separator { divider, spacing } => {
                json!({"type": 14, "divider": divider, "spacing": spacing})
            }
            Component::Container {
                children,
                accent_color,
                accessory,
            } => {
                let rendered: Vec<Value> =
                    children.iter().map(Self::render_component).collect();
                let mut payload = json!({"type": 17, "components": rendered});
                if let Some(color) = accent_color {
                    payload["accent_color"] = json!(color);
                }
                if let Some(acc) = accessory.as_deref() {
                    payload["accessory"] = Self::render_component(acc);
                }
                payload
            }
        }
    }
}

impl RenderBackend for ComponentsV2 {
    fn chunk(&self, components: Vec<Component>) -> Vec<Vec<Component>> {
        chunk_components(components, CHUNK_CAPACITY)
    }

    fn render_chunk(&self, chunk: &[Component], ephemeral: bool) -> Value {
        let flags = COMPONENTS_V2_FLAG | if ephemeral { EPHEMERAL_FLAG } else { 0 };
        let rendered: Vec<Value> = chunk.iter().map(Self::render_component).collect();
        json!({
            "flags": flags,
            "components": rendered,
            "allowed_mentions": {"parse": []},
        })
    }
}

/// Legacy embed-list payload: each top-level component flattens to one embed.
pub struct LegacyEmbeds;

impl LegacyEmbeds {
    fn render_embed(component: &Component) -> Value {
        match component {
            Component::Container {
                children,
                accent_color,
                ..
            } => {
                let mut texts = children.iter().flat_map(Component::text_lines);
                let title = texts.next().unwrap_or_default();
                let description = texts.collect::<Vec<_>>().join("\n");
                let mut embed = json!({"title": title, "description": description});
                if let Some(color) = accent_color {
                    embed["color"] = json!(color);
                }
                embed
            }
            other => json!({"description": other.text_lines().join("\n")}),
        }
    }
}

impl RenderBackend for LegacyEmbeds {
    fn chunk(&self, components: Vec<Component>) -> Vec<Vec<Component>> {
        components
            .chunks(MAX_EMBEDS_PER_MESSAGE)
            .map(|c| c.to_vec())
            .collect()
    }

    fn render_chunk(&self, chunk: &[Component], ephemeral: bool) -> Value {
        let embeds: Vec<Value> = chunk.iter().map(Self::render_embed).collect();
        let mut payload = json!({
            "embeds": embeds,
            "allowed_mentions": {"parse": []},
        });
        if ephemeral {
            payload["flags"] = json!(EPHEMERAL_FLAG);
        }
        payload
    }
}

// ---------------------------------------------------------------------------
// Card builders
// ---------------------------------------------------------------------------

fn listing_link_block(id: &str) -> String {
    format!("**Gamepass ID · ** `{id}`\n[Open Gamepass]({LISTING_URL_BASE}/{id})")
}

/// Full listing card: owner, price, payout, regional status, ID link.
pub fn listing_card(
    id: &str,
    price: Option<i64>,
    owner: Option<&str>,
    regional: Option<bool>,
) -> Component {
    let payout = crate::derive::payout(price);
    let price_text = price.map(|p| format!("{p} Robux")).unwrap_or_default();
    let payout_text = payout.map(|p| format!("{p} Robux")).unwrap_or_default();
    let regional_label = match regional {
        Some(true) => "Enabled",
        Some(false) => "Disabled",
        None => "Unknown",
    };

    let mut lines = Vec::new();
    if let Some(owner) = owner {
        lines.push(format!("*Owner:* {owner}"));
        lines.push(String::new());
    }
    lines.push(format!("**Gamepass Price · **  `{price_text}`"));
    lines.push(format!("**You will receive · **  `{payout_text}`"));

    Component::container(vec![
        Component::text("Gamepass Summary"),
        Component::separator(false, 1),
        Component::text(lines.join("\n")),
        Component::separator(true, 1),
        Component::text(format!("**Regional Pricing · **  **{regional_label}**")),
        Component::separator(false, 2),
        Component::text(listing_link_block(id)),
    ])
}

/// Card shown when both authenticated and anonymous lookups come up empty.
pub fn not_found_card(id: &str) -> Component {
    let content = format!("Could not find gamepass `{id}`.\n{}", listing_link_block(id));
    Component::container(vec![
        Component::text("Gamepass Not Found"),
        Component::separator(false, 1),
        Component::text(content),
    ])
}

/// Degraded card for a single failed item in a batch.
pub fn degraded_card(id: &str) -> Component {
    Component::container(vec![
        Component::text("Gamepass Summary"),
        Component::separator(false, 1),
        Component::text(format!("Failed to scan ID {id}")),
        Component::separator(false, 2),
        Component::text(listing_link_block(id)),
    ])
}

/// Trailing summary card for a multi-scan batch.
pub fn summary_card(total_price: i64, scanned: usize, with_price: usize) -> Component {
    let missing = scanned - with_price;
    let covered = crate::derive::covered_tax(total_price);
    let content = format!(
        "**TOTAL GAMEPASS PRICE · **  `{total_price} Robux`\n\
         **COVERED TAX · **  `{covered} Robux`\n\
         **ITEMS SCANNED · **  `{scanned}` (with price: `{with_price}`, missing: `{missing}`)"
    );
    Component::container(vec![
        Component::text("Multi-Scan Summary"),
        Component::separator(true, 1),
        Component::text(content),
    ])
}

/// Command overview card.
pub fn help_card() -> Component {
    let commands = "`scan <link_or_id> [--force]`\n\
                    `multi <links> [--force]`\n\
                    `serve`";
    Component::container(vec![
        Component::text("Commands"),
        Component::separator(false, 1),
        Component::text(commands),
        Component::separator(false, 1),
        Component::text("Tip: paste multiple links/IDs with spaces, commas, or newlines."),
    ])
}

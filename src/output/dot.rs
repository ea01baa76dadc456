// Graphviz DOT rendering
//
// Emits a clustered digraph: one cluster per module, one two-row HTML
// table node per handler, one labeled edge per message. Output depends on
// graph content only, so unchanged graphs render byte-identically.

use crate::config::{DiagramConfig, Direction};
use crate::model::{MessageFlowGraph, MessageHandler};
use tracing::warn;

/// Fill of the class-name row for handlers that are not highlighted
const CLASS_CELL_COLOR: &str = "white";

/// Module -> color assignment, scoped to a single render call
#[derive(Debug)]
pub struct ModulePalette<'a> {
    modules: Vec<&'a str>,
    palette: &'a [String],
    unknown_color: &'a str,
}

impl<'a> ModulePalette<'a> {
    /// Assign colors to the sorted module keys of `graph`
    pub fn for_graph(graph: &'a MessageFlowGraph, palette: &'a [String], unknown_color: &'a str) -> Self {
        Self {
            modules: graph.modules(),
            palette,
            unknown_color,
        }
    }

    /// Modules in color assignment order
    pub fn modules(&self) -> &[&'a str] {
        &self.modules
    }

    /// Color of a module: `palette[index % len]`, or the unknown color
    pub fn color_for(&self, module: &str) -> &'a str {
        let palette: &'a [String] = self.palette;
        let position = self.modules.binary_search_by(|probe| (*probe).cmp(module)).ok();
        match position {
            Some(index) if !palette.is_empty() => palette[index % palette.len()].as_str(),
            _ => {
                warn!(module, "no color assigned to module");
                self.unknown_color
            }
        }
    }
}

/// Renders a message flow graph as DOT text
#[derive(Debug, Clone)]
pub struct DotRenderer {
    direction: Direction,
    splines: String,
    cluster_color: String,
    palette: Vec<String>,
    unknown_color: String,
    highlight_color: String,
}

impl Default for DotRenderer {
    fn default() -> Self {
        Self::from_config(&DiagramConfig::default())
    }
}

impl DotRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer with the diagram settings from config
    pub fn from_config(config: &DiagramConfig) -> Self {
        Self {
            direction: config.direction,
            splines: config.splines.clone(),
            cluster_color: config.cluster_color.clone(),
            palette: config.palette.clone(),
            unknown_color: config.unknown_color.clone(),
            highlight_color: config.highlight_color.clone(),
        }
    }

    /// Set layout direction
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set the module color palette
    pub fn with_palette<I, S>(mut self, palette: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.palette = palette.into_iter().map(Into::into).collect();
        self
    }

    /// Set the fill used for the highlighted handler
    pub fn with_highlight_color(mut self, color: impl Into<String>) -> Self {
        self.highlight_color = color.into();
        self
    }

    /// Render `graph`, marking the handler named `highlight` if present
    pub fn render(&self, graph: &MessageFlowGraph, highlight: Option<&str>) -> String {
        let colors = ModulePalette::for_graph(graph, &self.palette, &self.unknown_color);

        let mut lines = vec![
            "digraph G {".to_string(),
            format!("\trankdir={}", self.direction.as_str()),
            "\tnode [shape=plaintext]".to_string(),
            format!("\tsplines={}", self.splines),
            String::new(),
        ];

        let mut handlers: Vec<&MessageHandler> = graph.vertices().collect();
        handlers.sort();

        for &module in colors.modules() {
            lines.push(format!("\tsubgraph \"cluster_{}\"", escape_quoted(module)));
            lines.push("\t{".to_string());
            lines.push(format!("\t\tlabel = \"{}\"", escape_quoted(module)));
            lines.push(format!("\t\tcolor = {}", self.cluster_color));
            lines.push("\t\trank=\"same\"".to_string());

            for handler in handlers.iter().filter(|h| h.module_name() == module) {
                let highlighted = highlight == Some(handler.full_name());
                lines.push(format!("\t\t{}", self.node_statement(handler, &colors, highlighted)));
            }

            lines.push("\t}".to_string());
        }

        lines.push(String::new());

        for edge in graph.sorted_edges() {
            let mut attributes = format!(
                "label=\"{}\", fontsize=10.0",
                escape_quoted(edge.message.short_name())
            );
            if let Some(comment) = edge.message.comment() {
                attributes.push_str(&format!(", tooltip=\"{}\"", escape_quoted(comment)));
            }
            lines.push(format!(
                "\t\"{}\" -> \"{}\" [{}]",
                escape_quoted(edge.source.full_name()),
                escape_quoted(edge.target.full_name()),
                attributes
            ));
        }

        lines.push("}".to_string());
        let mut text = lines.join("\n");
        text.push('\n');
        text
    }

    fn node_statement(&self, handler: &MessageHandler, colors: &ModulePalette<'_>, highlighted: bool) -> String {
        let class_color = if highlighted {
            self.highlight_color.as_str()
        } else {
            CLASS_CELL_COLOR
        };

        let label = format!(
            "<<TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\">\
             <TR><TD BGCOLOR=\"{}\">{}</TD></TR>\
             <TR><TD PORT=\"out\" BGCOLOR=\"{}\">{}</TD></TR>\
             </TABLE>>",
            escape_html(colors.color_for(handler.module_name())),
            escape_html(handler.namespace()),
            escape_html(class_color),
            escape_html(handler.class_name()),
        );

        let mut statement = format!("\"{}\" [label={}", escape_quoted(handler.full_name()), label);
        if let Some(tooltip) = node_tooltip(handler) {
            statement.push_str(&format!(", tooltip=\"{}\"", escape_quoted(&tooltip)));
        }
        statement.push(']');
        statement
    }
}

/// Hover text for a handler: entry point marker, then comment
fn node_tooltip(handler: &MessageHandler) -> Option<String> {
    let parts: Vec<String> = handler
        .entry_point()
        .map(|entry| format!("Entry point: {}", entry))
        .into_iter()
        .chain(handler.comment().map(str::to_string))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

/// Escape text for a double-quoted DOT string
pub fn escape_quoted(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Escape text for a DOT HTML-like label
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MessageDefinition;

    fn shop_graph() -> MessageFlowGraph {
        let mut graph = MessageFlowGraph::new();
        let api = MessageHandler::new("Shop.Orders.Api.OrderController").with_entry_point("Place order");
        let saga = MessageHandler::new("Shop.Orders.Sagas.CheckoutSaga");
        let invoice = MessageHandler::new("Shop.Billing.Workers.InvoiceConsumer");

        graph.add_flow(&api, &saga, &MessageDefinition::new("Shop.Contracts.OrderPlaced").with_comment("new order"));
        graph.add_flow(&saga, &invoice, &MessageDefinition::new("Shop.Contracts.BillOrder"));
        graph.add_flow(&invoice, &saga, &MessageDefinition::new("Shop.Contracts.OrderBilled"));
        graph
    }

    #[test]
    fn test_render_header() {
        let dot = DotRenderer::new().render(&shop_graph(), None);
        assert!(dot.starts_with("digraph G {\n\trankdir=LR\n\tnode [shape=plaintext]\n\tsplines=ortho\n"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_render_direction() {
        let dot = DotRenderer::new().with_direction(Direction::TB).render(&shop_graph(), None);
        assert!(dot.contains("\trankdir=TB\n"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let graph = shop_graph();
        let renderer = DotRenderer::new();
        assert_eq!(renderer.render(&graph, None), renderer.render(&graph, None));
        assert_eq!(renderer.render(&graph, None), renderer.render(&graph.clone(), None));
    }

    #[test]
    fn test_render_ignores_insertion_order() {
        let a = MessageHandler::new("x.y.z.A");
        let b = MessageHandler::new("p.q.r.B");
        let m1 = MessageDefinition::new("m.One");
        let m2 = MessageDefinition::new("m.Two");

        let mut first = MessageFlowGraph::new();
        first.add_flow(&a, &b, &m1);
        first.add_flow(&b, &a, &m2);

        let mut second = MessageFlowGraph::new();
        second.add_flow(&b, &a, &m2);
        second.add_flow(&a, &b, &m1);

        let renderer = DotRenderer::new();
        assert_eq!(renderer.render(&first, None), renderer.render(&second, None));
    }

    #[test]
    fn test_one_cluster_per_module() {
        let dot = DotRenderer::new().render(&shop_graph(), None);

        assert_eq!(dot.matches("subgraph \"cluster_").count(), 3);
        assert!(dot.contains("subgraph \"cluster_Shop.Billing.Workers\""));
        assert!(dot.contains("\t\tlabel = \"Shop.Orders.Sagas\""));
        assert!(dot.contains("\t\tcolor = blue"));

        let billing = dot.find("cluster_Shop.Billing.Workers").unwrap();
        let orders = dot.find("cluster_Shop.Orders.Api").unwrap();
        assert!(billing < orders);
    }

    #[test]
    fn test_module_colors_follow_sorted_order() {
        let graph = shop_graph();
        let colors = DiagramConfig::default().palette;
        let palette = ModulePalette::for_graph(&graph, &colors, "#FF0000");

        assert_eq!(palette.modules(), &["Shop.Billing.Workers", "Shop.Orders.Api", "Shop.Orders.Sagas"]);
        assert_eq!(palette.color_for("Shop.Billing.Workers"), "#ADD8E6");
        assert_eq!(palette.color_for("Shop.Orders.Api"), "#008B8B");
        assert_eq!(palette.color_for("Shop.Orders.Sagas"), "#F4A460");
    }

    #[test]
    fn test_palette_wraps_around() {
        let mut graph = MessageFlowGraph::new();
        for module in ["a", "b", "c"] {
            graph.add_vertex(MessageHandler::new(format!("{}.x.y.H", module)));
        }
        let colors = vec!["red".to_string(), "green".to_string()];
        let palette = ModulePalette::for_graph(&graph, &colors, "black");

        assert_eq!(palette.color_for("a.x.y"), "red");
        assert_eq!(palette.color_for("b.x.y"), "green");
        assert_eq!(palette.color_for("c.x.y"), "red");
    }

    #[test]
    fn test_custom_palette() {
        let dot = DotRenderer::new().with_palette(["tan"]).render(&shop_graph(), None);
        assert_eq!(dot.matches("<TD BGCOLOR=\"tan\">").count(), 3);
    }

    #[test]
    fn test_unknown_module_color() {
        let graph = shop_graph();
        let colors = DiagramConfig::default().palette;
        let palette = ModulePalette::for_graph(&graph, &colors, "#FF0000");
        assert_eq!(palette.color_for("Not.A.Module"), "#FF0000");
    }

    #[test]
    fn test_empty_palette_uses_unknown_color() {
        let graph = shop_graph();
        let palette = ModulePalette::for_graph(&graph, &[], "#FF0000");
        assert_eq!(palette.color_for("Shop.Orders.Api"), "#FF0000");
    }

    #[test]
    fn test_color_stability_across_renders() {
        let graph = shop_graph();
        let renderer = DotRenderer::new();
        let first = renderer.render(&graph, None);
        let second = renderer.render(&graph, None);

        let colors = |dot: &str| -> Vec<String> {
            dot.lines()
                .filter_map(|line| line.split("<TD BGCOLOR=\"").nth(1))
                .map(|rest| rest[..7].to_string())
                .collect()
        };
        assert_eq!(colors(&first), colors(&second));
        assert_eq!(colors(&first).len(), 3);
    }

    #[test]
    fn test_node_rows() {
        let dot = DotRenderer::new().render(&shop_graph(), None);
        assert!(dot.contains(
            "\"Shop.Orders.Sagas.CheckoutSaga\" [label=<<TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\">\
             <TR><TD BGCOLOR=\"#F4A460\">Shop.Orders.Sagas</TD></TR>\
             <TR><TD PORT=\"out\" BGCOLOR=\"white\">CheckoutSaga</TD></TR></TABLE>>]"
        ));
    }

    #[test]
    fn test_highlight_vertex() {
        let dot = DotRenderer::new()
            .with_highlight_color("gold")
            .render(&shop_graph(), Some("Shop.Orders.Api.OrderController"));

        assert!(dot.contains("<TD PORT=\"out\" BGCOLOR=\"gold\">OrderController</TD>"));
        assert_eq!(dot.matches("BGCOLOR=\"gold\"").count(), 1);
    }

    #[test]
    fn test_highlight_missing_vertex_is_ignored() {
        let graph = shop_graph();
        let renderer = DotRenderer::new();
        assert_eq!(renderer.render(&graph, Some("No.Such.Handler")), renderer.render(&graph, None));
    }

    #[test]
    fn test_edge_statements() {
        let dot = DotRenderer::new().render(&shop_graph(), None);

        assert!(dot.contains(
            "\t\"Shop.Orders.Api.OrderController\" -> \"Shop.Orders.Sagas.CheckoutSaga\" \
             [label=\"OrderPlaced\", fontsize=10.0, tooltip=\"new order\"]"
        ));
        assert!(dot.contains(
            "\t\"Shop.Orders.Sagas.CheckoutSaga\" -> \"Shop.Billing.Workers.InvoiceConsumer\" \
             [label=\"BillOrder\", fontsize=10.0]"
        ));
        assert_eq!(dot.matches(" -> ").count(), 3);
    }

    #[test]
    fn test_parallel_edges_rendered() {
        let mut graph = MessageFlowGraph::new();
        let a = MessageHandler::new("x.y.z.A");
        let b = MessageHandler::new("x.y.z.B");
        graph.add_flow(&a, &b, &MessageDefinition::new("m.One"));
        graph.add_flow(&a, &b, &MessageDefinition::new("m.Two"));

        let dot = DotRenderer::new().render(&graph, None);
        assert_eq!(dot.matches("\"x.y.z.A\" -> \"x.y.z.B\"").count(), 2);
    }

    #[test]
    fn test_entry_point_tooltip() {
        let dot = DotRenderer::new().render(&shop_graph(), None);
        assert!(dot.contains("tooltip=\"Entry point: Place order\""));
    }

    #[test]
    fn test_comments_are_escaped() {
        let mut graph = MessageFlowGraph::new();
        let a = MessageHandler::new("x.y.z.A").with_comment("say \"hi\" <b>\\ok</b>\nbye");
        let b = MessageHandler::new("x.y.z.B");
        graph.add_flow(&a, &b, &MessageDefinition::new("m.Msg").with_comment("a \"quoted\" [tag]"));

        let dot = DotRenderer::new().render(&graph, None);

        assert!(dot.contains("tooltip=\"say \\\"hi\\\" <b>\\\\ok</b>\\nbye\""));
        assert!(dot.contains("tooltip=\"a \\\"quoted\\\" [tag]\""));
        assert_eq!(dot.lines().filter(|l| l.contains("bye")).count(), 1);
    }

    #[test]
    fn test_html_names_are_escaped() {
        let mut graph = MessageFlowGraph::new();
        graph.add_vertex(MessageHandler::new("x.y.z.Handler<T>"));

        let dot = DotRenderer::new().render(&graph, None);
        assert!(dot.contains(">Handler&lt;T&gt;</TD>"));
    }

    #[test]
    fn test_render_empty_graph() {
        let dot = DotRenderer::new().render(&MessageFlowGraph::new(), None);
        assert!(!dot.contains("subgraph"));
        assert!(!dot.contains("->"));
    }

    #[test]
    fn test_escape_helpers() {
        assert_eq!(escape_quoted(r#"a"b\c"#), r#"a\"b\\c"#);
        assert_eq!(escape_html("a&b<c>\"d\""), "a&amp;b&lt;c&gt;&quot;d&quot;");
    }
}

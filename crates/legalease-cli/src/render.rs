//! Plain-text views of a simulation page

use std::collections::HashSet;
use std::fmt::Write;

use colored::Colorize;
use dialogue_core::{DialogueNode, NodeId, Party};
use scenario_state::TurnPhase;

/// Indented tree, selected path starred, bookmarked paths flagged.
pub fn render_tree(tree: &DialogueNode, bookmarked: &HashSet<NodeId>) -> String {
    let mut out = String::new();
    write_node(&mut out, tree, 0, bookmarked);
    out
}

fn write_node(out: &mut String, node: &DialogueNode, depth: usize, bookmarked: &HashSet<NodeId>) {
    let marker = if node.selected { "*" } else { "-" };
    let flag = if bookmarked.contains(&node.id) { " [bookmarked]" } else { "" };
    let line = format!(
        "{}{} [{}] {}: {}{}",
        "  ".repeat(depth),
        marker,
        node.id,
        node.party,
        node.statement,
        flag
    );
    let line = if node.selected {
        line.bold().to_string()
    } else {
        line
    };
    let _ = writeln!(out, "{line}");
    for child in &node.children {
        write_node(out, child, depth + 1, bookmarked);
    }
}

/// Transcript of the selected path.
pub fn render_conversation(path: &[&DialogueNode]) -> String {
    let mut out = String::new();
    for node in path {
        let speaker = match node.party {
            Party::A => "Party A".cyan(),
            Party::B => "Party B".yellow(),
        };
        let _ = writeln!(out, "{}: {}", speaker.bold(), node.statement);
    }
    out
}

/// What the user can do next.
pub fn render_turn(turn: &TurnPhase) -> String {
    let mut out = String::new();
    match turn {
        TurnPhase::Inactive => out.push_str("No simulation loaded\n"),
        TurnPhase::PartyAAwaitingInput { options } => {
            out.push_str("Party A to speak: type a statement or pick an option\n");
            write_options(&mut out, options);
        }
        TurnPhase::PartyBAwaitingSelection { options } => {
            if options.is_empty() {
                out.push_str("Party B to reply: generate replies first\n");
            } else {
                out.push_str("Party B to reply: pick one\n");
                write_options(&mut out, options);
            }
        }
        TurnPhase::Generating { party } => {
            let _ = writeln!(out, "Generating statements for Party {party}...");
        }
        TurnPhase::Submitting => out.push_str("Saving statement...\n"),
        TurnPhase::Selecting => out.push_str("Saving selection...\n"),
    }
    out
}

fn write_options(out: &mut String, options: &[dialogue_core::ResponseOption]) {
    for (idx, option) in options.iter().enumerate() {
        let _ = writeln!(out, "  {}. {} ({})", idx + 1, option.text, option.id);
    }
}

#[cfg(test)]
mod tests {
    use dialogue_core::ResponseOption;

    use super::*;

    fn sample() -> DialogueNode {
        DialogueNode::new(1_i64, "Pay the deposit", Party::B)
            .with_child(DialogueNode::new(2_i64, "No", Party::A))
            .with_child(DialogueNode::new(3_i64, "Half of it", Party::A))
            .with_selected_path(&NodeId::Persisted(3))
    }

    #[test]
    fn tree_lists_every_node_indented() {
        colored::control::set_override(false);
        let bookmarked = HashSet::from([NodeId::Persisted(2)]);
        let text = render_tree(&sample(), &bookmarked);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "* [1] B: Pay the deposit",
                "  - [2] A: No [bookmarked]",
                "  * [3] A: Half of it",
            ]
        );
    }

    #[test]
    fn turn_numbers_options() {
        colored::control::set_override(false);
        let turn = TurnPhase::PartyBAwaitingSelection {
            options: vec![ResponseOption {
                id: NodeId::Persisted(4),
                text: "Deal".to_string(),
            }],
        };
        assert_eq!(
            render_turn(&turn),
            "Party B to reply: pick one\n  1. Deal (4)\n"
        );
    }

    #[test]
    fn empty_party_b_turn_asks_for_generation() {
        let turn = TurnPhase::PartyBAwaitingSelection { options: vec![] };
        assert!(render_turn(&turn).contains("generate"));
    }
}

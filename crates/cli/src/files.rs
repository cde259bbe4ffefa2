use anyhow::{Context, Result};
use flowboard_graph::{Board, Node};
use flowboard_protocol::{parse_command_batch, BoardCommand};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Catalog files are either a bare template list or `{ "nodes": [...] }`
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Templates(Vec<Node>),
    Wrapped { nodes: Vec<Node> },
}

pub fn load_board(path: &Path) -> Result<Board> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read board file {}", path.display()))?;
    let board: Board = serde_json::from_str(&raw)
        .with_context(|| format!("Board file {} is not a valid board", path.display()))?;
    log::debug!(
        "Loaded board {} ({} nodes, {} layers) from {}",
        board.id,
        board.node_count(),
        board.layers.len(),
        path.display()
    );
    Ok(board)
}

pub fn load_catalog(path: &Path) -> Result<Vec<Node>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
    let catalog: CatalogFile = serde_json::from_str(&raw)
        .with_context(|| format!("Catalog file {} is not a list of node templates", path.display()))?;
    Ok(match catalog {
        CatalogFile::Templates(nodes) | CatalogFile::Wrapped { nodes } => nodes,
    })
}

pub fn load_commands(path: &Path) -> Result<Vec<BoardCommand>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read command file {}", path.display()))?;
    parse_command_batch(&raw).with_context(|| format!("Invalid command file {}", path.display()))
}

pub fn write_board(path: &Path, board: &Board) -> Result<()> {
    let json = serde_json::to_string_pretty(board)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("Failed to write board to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn catalog_accepts_both_shapes() {
        let dir = tempdir().unwrap();
        let template = r#"{"id":"t1","name":"log_message","friendly_name":"Log Message"}"#;

        let bare = dir.path().join("bare.json");
        fs::write(&bare, format!("[{template}]")).unwrap();
        let wrapped = dir.path().join("wrapped.json");
        fs::write(&wrapped, format!(r#"{{"nodes":[{template}]}}"#)).unwrap();

        assert_eq!(load_catalog(&bare).unwrap().len(), 1);
        assert_eq!(load_catalog(&wrapped).unwrap()[0].name, "log_message");
    }

    #[test]
    fn board_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.json");
        let board = Board::new("b1", "Demo");

        write_board(&path, &board).unwrap();
        assert_eq!(load_board(&path).unwrap(), board);
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = load_board(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}

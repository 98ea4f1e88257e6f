//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Editing commands load a local workflow file into a `Session`, apply one
//! edit and write the file back. A rejected edit leaves the file untouched.

use pathway::api::{self, AppState, KindsResponse};
use pathway::config::Config;
use pathway_core::{
    EdgeId, Editor, GraphDocument, NodeId, PathwayError, PersistenceGateway, Position,
    SaveOutcome, Session, Store, ValidationIssue, WorkflowId, blake3_hex, checksum,
    from_json_str, primitives::MAX_DOCUMENT_BYTES, to_json_pretty, validate, verify_checksum,
};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE VALIDATION
// =============================================================================

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), PathwayError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| PathwayError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(PathwayError::DeserializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize an input path and make sure it names a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, PathwayError> {
    let canonical = path.canonicalize().map_err(|e| {
        PathwayError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(PathwayError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Canonicalize the parent of an output path; the file itself may not exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, PathwayError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        PathwayError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(PathwayError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| PathwayError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// DOCUMENT FILES
// =============================================================================

/// Read and strictly deserialize a workflow file.
fn read_document(path: &Path) -> Result<GraphDocument, PathwayError> {
    let canonical = validate_file_path(path)?;
    validate_file_size(&canonical, MAX_DOCUMENT_BYTES as u64)?;
    let text = std::fs::read_to_string(&canonical)
        .map_err(|e| PathwayError::IoError(format!("Cannot read '{}': {}", path.display(), e)))?;
    from_json_str(&text)
}

/// Write a workflow file in the persisted shape.
fn write_document(path: &Path, doc: &GraphDocument) -> Result<(), PathwayError> {
    let target = validate_output_path(path)?;
    let text = to_json_pretty(doc)?;
    std::fs::write(&target, text)
        .map_err(|e| PathwayError::IoError(format!("Cannot write '{}': {}", path.display(), e)))
}

fn open_store(config: &Config) -> Result<Store, PathwayError> {
    let kind = config.storage.backend_kind()?;
    Store::open(kind, &config.storage.path)
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn print_issues(issues: &[ValidationIssue]) {
    for (i, issue) in issues.iter().enumerate() {
        println!("  {}. [{}] {}", i + 1, issue.rule_violated, issue.message);
    }
}

// =============================================================================
// INIT / SHOW / VALIDATE
// =============================================================================

/// Write a new workflow file holding only the seeded entry and exit.
pub fn cmd_init(file: &Path, force: bool, json_mode: bool) -> Result<(), PathwayError> {
    if file.exists() && !force {
        return Err(PathwayError::IoError(format!(
            "'{}' already exists. Use --force to overwrite.",
            file.display()
        )));
    }

    let doc = GraphDocument::create_empty();
    write_document(file, &doc)?;

    if json_mode {
        print_json(&serde_json::json!({
            "file": file.to_string_lossy(),
            "entry": doc.entry_node_id(),
            "nodes": doc.node_count(),
        }));
    } else {
        println!("Initialized workflow {}", file.display());
        println!("Entry node: {}", doc.entry_node_id());
    }
    Ok(())
}

/// Show nodes with their editing state, edges, and open issues.
pub fn cmd_show(file: &Path, json_mode: bool) -> Result<(), PathwayError> {
    let session = Session::with_document(read_document(file)?, None);
    let doc = session.document();
    let states = session.node_states();
    let issues = session.validate().into_issues();

    if json_mode {
        let nodes: Vec<_> = doc
            .nodes()
            .map(|node| {
                serde_json::json!({
                    "id": node.id,
                    "type": node.node_type().as_str(),
                    "label": node.label,
                    "state": states.get(&node.id),
                })
            })
            .collect();
        let edges: Vec<_> = doc
            .edges()
            .iter()
            .map(|edge| {
                serde_json::json!({
                    "id": edge.id,
                    "source": edge.source,
                    "target": edge.target,
                    "label": edge.label,
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "file": file.to_string_lossy(),
            "entryNodeId": doc.entry_node_id(),
            "nodes": nodes,
            "edges": edges,
            "issues": issues,
        }));
        return Ok(());
    }

    println!("Workflow {}", file.display());
    println!("==================");
    println!("Entry: {}", doc.entry_node_id());
    println!();
    println!("Nodes ({}):", doc.node_count());
    for node in doc.nodes() {
        let state = states
            .get(&node.id)
            .map(|s| s.as_str())
            .unwrap_or_default();
        println!(
            "  {:<16} {:<10} {:<13} {}",
            node.id,
            node.node_type(),
            state,
            node.label
        );
    }
    println!();
    println!("Edges ({}):", doc.edge_count());
    for edge in doc.edges() {
        match edge.label {
            Some(label) => println!(
                "  {:<16} {} -[{}]-> {}",
                edge.id, edge.source, label, edge.target
            ),
            None => println!("  {:<16} {} -> {}", edge.id, edge.source, edge.target),
        }
    }
    println!();
    if issues.is_empty() {
        println!("No issues.");
    } else {
        println!("Issues ({}):", issues.len());
        print_issues(&issues);
    }
    Ok(())
}

/// Validate a workflow file. Returns whether it is valid.
pub fn cmd_validate(file: &Path, json_mode: bool) -> Result<bool, PathwayError> {
    let doc = read_document(file)?;
    let issues = validate(&doc).into_issues();
    let valid = issues.is_empty();

    if json_mode {
        print_json(&serde_json::json!({
            "file": file.to_string_lossy(),
            "valid": valid,
            "issues": issues,
        }));
    } else if valid {
        println!("{}: valid", file.display());
    } else {
        println!("{}: {} issue(s)", file.display(), issues.len());
        print_issues(&issues);
    }
    Ok(valid)
}

// =============================================================================
// EDIT COMMANDS
// =============================================================================

/// Apply one edit to a workflow file and write it back.
fn edit_file<F>(file: &Path, json_mode: bool, action: &str, op: F) -> Result<(), PathwayError>
where
    F: FnOnce(&GraphDocument) -> Result<GraphDocument, PathwayError>,
{
    let mut session = Session::with_document(read_document(file)?, None);
    session.apply(op)?;
    write_document(file, session.document())?;
    report_edit(file, &session, action, None, json_mode);
    Ok(())
}

/// Apply one insertion to a workflow file and write it back.
fn insert_into_file<F>(file: &Path, json_mode: bool, op: F) -> Result<(), PathwayError>
where
    F: FnOnce(&GraphDocument) -> Result<(GraphDocument, NodeId), PathwayError>,
{
    let mut session = Session::with_document(read_document(file)?, None);
    let id = session.apply_insert(op)?;
    write_document(file, session.document())?;
    report_edit(file, &session, "added", Some(id.as_str()), json_mode);
    Ok(())
}

fn report_edit(
    file: &Path,
    session: &Session,
    action: &str,
    created: Option<&str>,
    json_mode: bool,
) {
    let doc = session.document();
    let issues = session.validate().issues().len();

    if json_mode {
        print_json(&serde_json::json!({
            "file": file.to_string_lossy(),
            "action": action,
            "id": created,
            "nodes": doc.node_count(),
            "edges": doc.edge_count(),
            "issues": issues,
        }));
        return;
    }

    match created {
        Some(id) => println!("{} {}", action, id),
        None => println!("{}", action),
    }
    println!(
        "{}: {} nodes, {} edges, {} open issue(s)",
        file.display(),
        doc.node_count(),
        doc.edge_count(),
        issues
    );
}

pub fn cmd_add_exercise(
    file: &Path,
    kind: &str,
    label: &str,
    x: f64,
    y: f64,
    json_mode: bool,
) -> Result<(), PathwayError> {
    insert_into_file(file, json_mode, |doc| {
        Editor::insert_exercise_node(doc, kind, label, Position::new(x, y))
    })
}

pub fn cmd_add_condition(
    file: &Path,
    kind: &str,
    expression: &str,
    label: &str,
    x: f64,
    y: f64,
    json_mode: bool,
) -> Result<(), PathwayError> {
    insert_into_file(file, json_mode, |doc| {
        Editor::insert_condition_node(doc, kind, expression, label, Position::new(x, y))
    })
}

pub fn cmd_add_exit(
    file: &Path,
    label: &str,
    x: f64,
    y: f64,
    json_mode: bool,
) -> Result<(), PathwayError> {
    insert_into_file(file, json_mode, |doc| {
        Editor::insert_exit_node(doc, label, Position::new(x, y))
    })
}

pub fn cmd_connect(
    file: &Path,
    from: &str,
    to: &str,
    label: Option<&str>,
    json_mode: bool,
) -> Result<(), PathwayError> {
    let (from, to) = (NodeId::new(from), NodeId::new(to));
    let action = match label {
        Some(label) => format!("connected {} -[{}]-> {}", from, label, to),
        None => format!("connected {} -> {}", from, to),
    };
    edit_file(file, json_mode, &action, |doc| {
        Editor::wire(doc, &from, &to, label)
    })
}

pub fn cmd_disconnect(file: &Path, edge: &str, json_mode: bool) -> Result<(), PathwayError> {
    let edge = EdgeId::new(edge);
    let action = format!("removed edge {}", edge);
    edit_file(file, json_mode, &action, |doc| Editor::unwire(doc, &edge))
}

pub fn cmd_retitle(
    file: &Path,
    node: &str,
    label: &str,
    json_mode: bool,
) -> Result<(), PathwayError> {
    let node = NodeId::new(node);
    let action = format!("retitled {}", node);
    edit_file(file, json_mode, &action, |doc| {
        Editor::retitle(doc, &node, label)
    })
}

pub fn cmd_move(
    file: &Path,
    node: &str,
    x: f64,
    y: f64,
    json_mode: bool,
) -> Result<(), PathwayError> {
    let node = NodeId::new(node);
    let action = format!("moved {}", node);
    edit_file(file, json_mode, &action, |doc| {
        Editor::reposition(doc, &node, Position::new(x, y))
    })
}

pub fn cmd_remove(file: &Path, node: &str, json_mode: bool) -> Result<(), PathwayError> {
    let node = NodeId::new(node);
    let action = format!("removed {}", node);
    edit_file(file, json_mode, &action, |doc| Editor::delete_node(doc, &node))
}

// =============================================================================
// KINDS / HASH
// =============================================================================

/// List node types, exercise kinds and condition kinds.
pub fn cmd_kinds(json_mode: bool) {
    let kinds = KindsResponse::from_registry();

    if json_mode {
        println!("{}", serde_json::to_string_pretty(&kinds).unwrap_or_default());
        return;
    }

    println!("Node types:");
    for node_type in &kinds.node_types {
        let fields: Vec<String> = node_type
            .fields
            .iter()
            .map(|f| {
                if f.required {
                    format!("{}: {}", f.name, f.field_type)
                } else {
                    format!("{}?: {}", f.name, f.field_type)
                }
            })
            .collect();
        println!(
            "  {:<10} outgoing={:<8} {{ {} }}",
            node_type.name,
            node_type.outgoing,
            fields.join(", ")
        );
    }
    println!();
    println!("Exercise kinds:  {}", kinds.exercise_kinds.join(", "));
    println!("Condition kinds: {}", kinds.condition_kinds.join(", "));
}

/// Compute the checksum and BLAKE3 digest of a workflow file.
/// Print the fingerprints of a workflow file.
///
/// With `expect`, returns whether the file still has that checksum.
pub fn cmd_hash(file: &Path, expect: Option<u64>, json_mode: bool) -> Result<bool, PathwayError> {
    let doc = read_document(file)?;
    let checksum = format!("{:016x}", checksum(&doc)?);
    let blake3 = blake3_hex(&doc)?;
    let matches = match expect {
        Some(expected) => Some(verify_checksum(&doc, expected)?),
        None => None,
    };

    if json_mode {
        print_json(&serde_json::json!({
            "file": file.to_string_lossy(),
            "checksum": checksum,
            "blake3": blake3,
            "matches": matches,
        }));
    } else {
        println!("Checksum: {}", checksum);
        println!("BLAKE3:   {}", blake3);
        match matches {
            Some(true) => println!("Matches the expected checksum"),
            Some(false) => println!("Does NOT match the expected checksum"),
            None => {}
        }
    }
    Ok(matches.unwrap_or(true))
}

// =============================================================================
// STORAGE COMMANDS
// =============================================================================

/// Validate a workflow file and store it. Returns whether it was stored.
pub fn cmd_push(
    config: &Config,
    file: &Path,
    id: &str,
    json_mode: bool,
) -> Result<bool, PathwayError> {
    let id = WorkflowId::parse(id)?;
    let mut session = Session::with_document(read_document(file)?, None);
    let mut store = open_store(config)?;

    if matches!(store, Store::Memory(_)) {
        tracing::warn!("Memory backend selected: the pushed workflow is discarded on exit");
    }

    let outcome = session.save_as(&mut store, id.clone())?;

    match &outcome {
        SaveOutcome::Saved => {
            tracing::info!(workflow = %id, backend = %store.kind(), "Workflow pushed");
        }
        SaveOutcome::Blocked(issues) => {
            tracing::info!(workflow = %id, issues = issues.len(), "Push blocked by validation");
        }
    }

    if json_mode {
        let issues: &[ValidationIssue] = match &outcome {
            SaveOutcome::Saved => &[],
            SaveOutcome::Blocked(issues) => issues,
        };
        print_json(&serde_json::json!({
            "id": id,
            "saved": outcome.is_saved(),
            "issues": issues,
        }));
    } else {
        match &outcome {
            SaveOutcome::Saved => println!("Stored {} as '{}'", file.display(), id),
            SaveOutcome::Blocked(issues) => {
                println!("Not stored: fix {} issue(s) first", issues.len());
                print_issues(issues);
            }
        }
    }

    Ok(outcome.is_saved())
}

/// Write a stored workflow to a local file.
pub fn cmd_pull(
    config: &Config,
    id: &str,
    file: &Path,
    json_mode: bool,
) -> Result<(), PathwayError> {
    let id = WorkflowId::parse(id)?;
    let store = open_store(config)?;
    let session = Session::load(&store, id.clone())?;
    write_document(file, session.document())?;

    if json_mode {
        print_json(&serde_json::json!({
            "id": id,
            "file": file.to_string_lossy(),
            "nodes": session.document().node_count(),
        }));
    } else {
        println!("Wrote '{}' to {}", id, file.display());
    }
    Ok(())
}

/// List stored workflow ids.
pub fn cmd_list(config: &Config, json_mode: bool) -> Result<(), PathwayError> {
    let store = open_store(config)?;
    let ids = store.list()?;

    if json_mode {
        print_json(&serde_json::json!({
            "backend": store.kind().as_str(),
            "workflows": ids,
        }));
        return Ok(());
    }

    if ids.is_empty() {
        println!("No stored workflows ({} backend)", store.kind());
    } else {
        for id in ids {
            println!("{}", id);
        }
    }
    Ok(())
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP storage API.
pub async fn cmd_serve(config: Config) -> Result<(), PathwayError> {
    let store = open_store(&config)?;

    println!("Pathway Storage API Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:  {}", config.server.bind_addr());
    println!("  Backend:  {}", store.kind());
    println!("  Database: {:?}", config.storage.path);
    println!();
    println!("Endpoints:");
    println!("  GET  /health              - Health check");
    println!("  GET  /kinds               - Node types and kinds");
    println!("  GET  /workflows           - Stored workflow ids");
    println!("  GET  /workflows/{{id}}      - Load a workflow");
    println!("  PUT  /workflows/{{id}}      - Validate and store a workflow");
    println!("  GET  /workflows/{{id}}/hash - Workflow fingerprints");
    println!("  POST /validate            - Validate without storing");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(AppState::new(store, config.server)).await
}

// =============================================================================
// TESTS
// =============================================================================

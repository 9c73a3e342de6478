use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Folder,
}

/// Children as the tree loader sees them: `true` means "ask again later".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Children {
    Lazy(bool),
    Loaded(Vec<TreeNode>),
}

impl Default for Children {
    fn default() -> Self {
        Children::Lazy(false)
    }
}

/// One entry returned by `getNodeTree`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeNode {
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub node_type: NodeKind,
    pub path: String,
    pub children: Children,
}

#[derive(Deserialize)]
struct RawTreeNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(rename = "type", default)]
    node_type: Option<String>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    children: Option<Children>,
}

/// Anything the loader doesn't call a folder opens like a file.
fn kind_from_type(node_type: Option<&str>) -> NodeKind {
    match node_type {
        Some("folder") => NodeKind::Folder,
        _ => NodeKind::File,
    }
}

impl<'de> Deserialize<'de> for TreeNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawTreeNode::deserialize(deserializer)?;
        let path = raw.path.or_else(|| raw.id.clone()).unwrap_or_default();
        let id = raw.id.unwrap_or_else(|| path.clone());
        let text = raw.text.unwrap_or_else(|| file_name(&path).to_string());
        Ok(TreeNode {
            id,
            text,
            node_type: kind_from_type(raw.node_type.as_deref()),
            path,
            children: raw.children.unwrap_or_default(),
        })
    }
}

impl TreeNode {
    pub fn is_folder(&self) -> bool {
        self.node_type == NodeKind::Folder
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTreeRequest<'a> {
    pub id: &'a str,
    pub environment_path: &'a str,
}

#[derive(Serialize)]
pub struct PathRequest<'a> {
    pub path: &'a str,
}

#[derive(Serialize)]
pub struct SaveTextRequest<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest<'a> {
    pub path: &'a str,
    pub is_folder: bool,
}

/// Shared by `renameNode` and `moveNode`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelocateRequest<'a> {
    pub old_path: &'a str,
    pub target_path: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SrcPathResponse {
    pub src_path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest<'a> {
    pub html: &'a str,
    pub src_path: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub preview_id: serde_json::Value,
}

/// Last path segment, ignoring a trailing slash.
pub fn file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Containing folder of `path`, or `None` at the root.
pub fn parent_path(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&trimmed[..idx]),
        None => None,
    }
}

/// `parent/name`, or just `name` when there is no parent.
pub fn join_node_path(parent: Option<&str>, name: &str) -> String {
    match parent.map(|p| p.trim_end_matches('/')) {
        Some(p) if !p.is_empty() => format!("{}/{}", p, name),
        Some(_) if parent == Some("/") => format!("/{}", name),
        _ => name.to_string(),
    }
}

/// Rewrites `path` if it is `old` or lies under it. Trailing slashes on
/// either side don't matter.
pub fn rebase_path(path: &str, old: &str, new: &str) -> Option<String> {
    let path = path.trim_end_matches('/');
    let old = old.trim_end_matches('/');
    let new = new.trim_end_matches('/');
    if old.is_empty() {
        return None;
    }
    if path == old {
        return Some(new.to_string());
    }
    let rest = path.strip_prefix(old)?;
    if rest.starts_with('/') {
        Some(format!("{}{}", new, rest))
    } else {
        None
    }
}

pub fn is_same_or_under(path: &str, root: &str) -> bool {
    rebase_path(path, root, root).is_some()
}

/// Folders first, then natural order on the display text.
pub fn sort_nodes(nodes: &mut [TreeNode]) {
    nodes.sort_by(|a, b| {
        if a.is_folder() != b.is_folder() {
            return b.is_folder().cmp(&a.is_folder());
        }
        natural_compare(&a.text, &b.text)
    });
    for node in nodes.iter_mut() {
        if let Children::Loaded(children) = &mut node.children {
            sort_nodes(children);
        }
    }
}

fn natural_compare(a: &str, b: &str) -> Ordering {
    natord::compare(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(text: &str, kind: NodeKind) -> TreeNode {
        TreeNode {
            id: text.to_string(),
            text: text.to_string(),
            node_type: kind,
            path: text.to_string(),
            children: Children::default(),
        }
    }

    #[test]
    fn decodes_lazy_and_nested_children() {
        let nodes: Vec<TreeNode> = serde_json::from_value(json!([
            {"id": "src", "text": "src", "type": "folder", "path": "src", "children": true},
            {"id": "src/a", "type": "folder", "path": "src/a", "children": [
                {"path": "src/a/b.js"}
            ]}
        ]))
        .unwrap();

        assert_eq!(nodes[0].children, Children::Lazy(true));
        assert!(nodes[0].is_folder());
        assert_eq!(nodes[1].text, "a");
        match &nodes[1].children {
            Children::Loaded(children) => {
                assert_eq!(children[0].id, "src/a/b.js");
                assert_eq!(children[0].text, "b.js");
                assert_eq!(children[0].node_type, NodeKind::File);
            }
            other => panic!("unexpected children {:?}", other),
        }
    }

    #[test]
    fn path_falls_back_to_id() {
        let n: TreeNode = serde_json::from_value(json!({"id": "x/y.txt"})).unwrap();
        assert_eq!(n.path, "x/y.txt");
        assert_eq!(n.text, "y.txt");
    }

    #[test]
    fn request_payloads_use_camel_case() {
        let body = serde_json::to_value(CreateNodeRequest { path: "/x/new.txt", is_folder: false }).unwrap();
        assert_eq!(body, json!({"path": "/x/new.txt", "isFolder": false}));
        let body = serde_json::to_value(RelocateRequest { old_path: "a", target_path: "b" }).unwrap();
        assert_eq!(body, json!({"oldPath": "a", "targetPath": "b"}));
        let body = serde_json::to_value(NodeTreeRequest { id: "#", environment_path: "dev" }).unwrap();
        assert_eq!(body, json!({"id": "#", "environmentPath": "dev"}));
    }

    #[test]
    fn path_helpers() {
        assert_eq!(file_name("a/b/c.txt"), "c.txt");
        assert_eq!(file_name("c.txt"), "c.txt");
        assert_eq!(file_name("a/b/"), "b");
        assert_eq!(parent_path("a/b/c.txt"), Some("a/b"));
        assert_eq!(parent_path("/c.txt"), Some("/"));
        assert_eq!(parent_path("c.txt"), None);
        assert_eq!(join_node_path(Some("a/b"), "c"), "a/b/c");
        assert_eq!(join_node_path(Some("a/b/"), "c"), "a/b/c");
        assert_eq!(join_node_path(Some("/"), "c"), "/c");
        assert_eq!(join_node_path(Some(""), "c"), "c");
        assert_eq!(join_node_path(None, "c"), "c");
    }

    #[test]
    fn rebase_only_matches_whole_segments() {
        assert_eq!(rebase_path("a/b", "a/b", "z"), Some("z".to_string()));
        assert_eq!(rebase_path("a/b/c.txt", "a/b", "z"), Some("z/c.txt".to_string()));
        assert_eq!(rebase_path("a/bc.txt", "a/b", "z"), None);
        assert!(is_same_or_under("a/b/c", "a"));
        assert!(!is_same_or_under("ab/c", "a"));
    }

    #[test]
    fn rebase_ignores_trailing_slashes() {
        assert_eq!(rebase_path("src/lib/a.js", "src/lib/", "src/core"), Some("src/core/a.js".to_string()));
        assert_eq!(rebase_path("src/lib", "src/lib/", "src/core/"), Some("src/core".to_string()));
        assert!(is_same_or_under("src/a.js", "src/"));
        assert!(is_same_or_under("src", "src/"));
        assert!(!is_same_or_under("src2/a.js", "src/"));
        assert_eq!(rebase_path("a.txt", "", "b"), None);
    }

    #[test]
    fn odd_nodes_do_not_break_the_listing() {
        let nodes: Vec<TreeNode> = serde_json::from_value(json!([
            {"id": "a", "type": "folder", "path": "a", "children": null},
            {"id": "b.md", "type": "default", "path": "b.md"},
            {"id": "c", "type": null, "path": "c"}
        ]))
        .unwrap();

        assert_eq!(nodes.len(), 3);
        assert!(nodes[0].is_folder());
        assert_eq!(nodes[0].children, Children::Lazy(false));
        assert_eq!(nodes[1].node_type, NodeKind::File);
        assert_eq!(nodes[2].node_type, NodeKind::File);
    }

    #[test]
    fn sorts_folders_first_then_naturally() {
        let mut nodes = vec![
            node("file10.txt", NodeKind::File),
            node("file2.txt", NodeKind::File),
            node("zeta", NodeKind::Folder),
            node("alpha", NodeKind::Folder),
        ];
        sort_nodes(&mut nodes);
        let names: Vec<_> = nodes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(names, ["alpha", "zeta", "file2.txt", "file10.txt"]);
    }
}

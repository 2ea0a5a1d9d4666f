//! Diagram type keywords understood by the rendering engine.

/// Diagram types, identified by the keyword that opens the diagram text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagramKind {
    Graph,
    Flowchart,
    Sequence,
    Class,
    State,
    Pie,
    Gantt,
    Journey,
    Requirement,
    GitGraph,
    EntityRelationship,
    Quadrant,
}

impl DiagramKind {
    pub const ALL: [Self; 12] = [
        Self::Graph,
        Self::Flowchart,
        Self::Sequence,
        Self::Class,
        Self::State,
        Self::Pie,
        Self::Gantt,
        Self::Journey,
        Self::Requirement,
        Self::GitGraph,
        Self::EntityRelationship,
        Self::Quadrant,
    ];

    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Graph => "graph",
            Self::Flowchart => "flowchart",
            Self::Sequence => "sequenceDiagram",
            Self::Class => "classDiagram",
            Self::State => "stateDiagram",
            Self::Pie => "pie",
            Self::Gantt => "gantt",
            Self::Journey => "journey",
            Self::Requirement => "requirementDiagram",
            Self::GitGraph => "gitGraph",
            Self::EntityRelationship => "erDiagram",
            Self::Quadrant => "quadrantChart",
        }
    }

    /// Exact keyword lookup.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.keyword() == word)
    }

    /// Detect the declared diagram type.
    ///
    /// The keyword must open the first statement after the preamble and be
    /// followed by a non-identifier character, so `stateDiagram-v2` is a
    /// state diagram and `graphic` is nothing.
    #[must_use]
    pub fn detect(text: &str) -> Option<Self> {
        let (_, body) = split_preamble(text);
        let body = body.trim_start();
        let end = body
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(body.len());
        Self::from_keyword(&body[..end])
    }

    /// Header inserted when a diagram declares no type.
    pub(crate) fn default_header(body: &str) -> &'static str {
        if body.contains("-->") {
            "flowchart TD"
        } else {
            "graph TD"
        }
    }
}

/// Split leading `%%` comment/directive lines and a `---` front-matter block
/// from the diagram body. Blank lines before the body belong to the preamble.
pub(crate) fn split_preamble(text: &str) -> (&str, &str) {
    let mut end = 0;
    let mut front_matter_open = false;
    let mut at_start = true;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if front_matter_open {
            front_matter_open = trimmed != "---";
        } else if trimmed == "---" && at_start {
            front_matter_open = true;
        } else if !(trimmed.is_empty() || trimmed.starts_with("%%")) {
            break;
        }
        if !trimmed.is_empty() {
            at_start = false;
        }
        end += line.len();
    }

    if front_matter_open {
        return ("", text);
    }
    text.split_at(end)
}

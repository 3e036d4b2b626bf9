// Selector engine for the simulated backend
//
// Resolves a Locator chain against a rendered element tree:
// - the tree is flattened once into preorder entries with parent links
// - a query step keeps entries that match and descend from the current scope
// - a filter step narrows the current scope in place
//
// Supported CSS subset: type selectors, `*`, `.class`, `#id`, `[attr]`,
// `[attr=value]` (value optionally quoted) and the descendant combinator.

use super::dom::Element;
use crate::error::{Error, Result};
use crate::locator::{AriaRole, Locator, Step, TextMatch, normalize_whitespace};

/// One resolved element.
#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    pub element: &'a Element,
    pub visible: bool,
}

struct Entry<'a> {
    element: &'a Element,
    parent: Option<usize>,
    visible: bool,
}

fn flatten<'a>(root: &'a Element) -> Vec<Entry<'a>> {
    fn walk<'a>(el: &'a Element, parent: Option<usize>, visible: bool, out: &mut Vec<Entry<'a>>) {
        let visible = visible && !el.has_attr("hidden");
        let index = out.len();
        out.push(Entry {
            element: el,
            parent,
            visible,
        });
        for child in el.child_elements() {
            walk(child, Some(index), visible, out);
        }
    }

    let mut out = Vec::new();
    walk(root, None, true, &mut out);
    out
}

/// Resolves `locator` against the tree rooted at `root`, in document order.
///
/// The root itself never matches a query step; it only scopes the first one.
pub fn resolve<'a>(root: &'a Element, locator: &Locator) -> Result<Vec<Match<'a>>> {
    let entries = flatten(root);
    let mut scope: Vec<usize> = vec![0];

    for step in locator.steps() {
        let matcher = StepMatcher::compile(step, locator)?;
        scope = if step.is_filter() {
            scope
                .into_iter()
                .filter(|&i| matcher.matches(&entries, i))
                .collect()
        } else {
            (0..entries.len())
                .filter(|&i| has_ancestor_in(&entries, i, &scope))
                .filter(|&i| matcher.matches(&entries, i))
                .collect()
        };
    }

    Ok(scope
        .into_iter()
        .map(|i| Match {
            element: entries[i].element,
            visible: entries[i].visible,
        })
        .collect())
}

fn has_ancestor_in(entries: &[Entry<'_>], index: usize, scope: &[usize]) -> bool {
    let mut current = entries[index].parent;
    while let Some(i) = current {
        if scope.contains(&i) {
            return true;
        }
        current = entries[i].parent;
    }
    false
}

enum StepMatcher<'s> {
    Css(Vec<Compound>),
    Role {
        role: AriaRole,
        name: Option<&'s TextMatch>,
    },
    Placeholder(&'s TextMatch),
    TestId(&'s str),
    HasText(&'s TextMatch),
}

impl<'s> StepMatcher<'s> {
    fn compile(step: &'s Step, locator: &Locator) -> Result<Self> {
        Ok(match step {
            Step::Css(css) => StepMatcher::Css(parse_css(css).map_err(|reason| {
                Error::InvalidSelector {
                    selector: locator.selector(),
                    reason,
                }
            })?),
            Step::Role { role, name } => StepMatcher::Role {
                role: *role,
                name: name.as_ref(),
            },
            Step::Placeholder(text) => StepMatcher::Placeholder(text),
            Step::TestId(id) => StepMatcher::TestId(id),
            Step::HasText(text) => StepMatcher::HasText(text),
        })
    }

    fn matches(&self, entries: &[Entry<'_>], index: usize) -> bool {
        let el = entries[index].element;
        match self {
            StepMatcher::Css(compounds) => css_matches(compounds, entries, index),
            StepMatcher::Role { role, name } => {
                implicit_role(el) == Some(*role)
                    && name.is_none_or(|name| name.matches(&accessible_name(el)))
            }
            StepMatcher::Placeholder(text) => {
                el.get_attr("placeholder").is_some_and(|p| text.matches(p))
            }
            StepMatcher::TestId(id) => el.get_attr("data-testid") == Some(*id),
            StepMatcher::HasText(text) => text.matches(&el.text_content()),
        }
    }
}

/// Role of an element: the explicit `role` attribute, else the implicit role
/// of its tag.
pub fn implicit_role(el: &Element) -> Option<AriaRole> {
    if let Some(role) = el.get_attr("role") {
        return match role {
            "button" => Some(AriaRole::Button),
            "checkbox" => Some(AriaRole::Checkbox),
            "heading" => Some(AriaRole::Heading),
            "link" => Some(AriaRole::Link),
            "list" => Some(AriaRole::List),
            "listitem" => Some(AriaRole::ListItem),
            "textbox" => Some(AriaRole::Textbox),
            _ => None,
        };
    }
    match el.tag {
        "a" if el.has_attr("href") => Some(AriaRole::Link),
        "button" => Some(AriaRole::Button),
        "input" => match el.get_attr("type").unwrap_or("text") {
            "checkbox" => Some(AriaRole::Checkbox),
            "text" | "search" | "email" | "url" | "tel" => Some(AriaRole::Textbox),
            _ => None,
        },
        "textarea" => Some(AriaRole::Textbox),
        "ul" | "ol" => Some(AriaRole::List),
        "li" => Some(AriaRole::ListItem),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(AriaRole::Heading),
        _ => None,
    }
}

/// Accessible name: `aria-label`, then `placeholder` for inputs, then text.
pub fn accessible_name(el: &Element) -> String {
    if let Some(label) = el.get_attr("aria-label") {
        return normalize_whitespace(label);
    }
    if el.tag == "input" {
        return el
            .get_attr("placeholder")
            .map(normalize_whitespace)
            .unwrap_or_default();
    }
    normalize_whitespace(&el.text_content())
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

impl Compound {
    fn matches(&self, el: &Element) -> bool {
        self.tag.as_deref().is_none_or(|tag| tag == el.tag)
            && self.id.as_deref().is_none_or(|id| el.get_attr("id") == Some(id))
            && self.classes.iter().all(|class| el.has_class(class))
            && self.attrs.iter().all(|(name, value)| match value {
                None => el.has_attr(name),
                Some(value) => el.get_attr(name) == Some(value.as_str()),
            })
    }
}

// Right-to-left: the last compound matches the element itself, each earlier
// compound must match some ancestor above the previous one.
fn css_matches(compounds: &[Compound], entries: &[Entry<'_>], index: usize) -> bool {
    let Some((last, rest)) = compounds.split_last() else {
        return false;
    };
    if !last.matches(entries[index].element) {
        return false;
    }

    let mut current = entries[index].parent;
    for compound in rest.iter().rev() {
        loop {
            let Some(i) = current else {
                return false;
            };
            current = entries[i].parent;
            if compound.matches(entries[i].element) {
                break;
            }
        }
    }
    true
}

fn parse_css(selector: &str) -> std::result::Result<Vec<Compound>, String> {
    let compounds: Vec<Compound> = selector
        .split_whitespace()
        .map(parse_compound)
        .collect::<std::result::Result<_, _>>()?;
    if compounds.is_empty() {
        return Err("empty selector".to_string());
    }
    Ok(compounds)
}

fn parse_compound(token: &str) -> std::result::Result<Compound, String> {
    let mut compound = Compound::default();
    let mut chars = token.char_indices().peekable();

    let ident_end = |from: usize| {
        token[from..]
            .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
            .map_or(token.len(), |offset| from + offset)
    };

    while let Some(&(pos, c)) = chars.peek() {
        let (end, part) = match c {
            '*' if pos == 0 => (pos + 1, None),
            '.' | '#' => {
                let end = ident_end(pos + 1);
                if end == pos + 1 {
                    return Err(format!("expected a name after '{}' in '{}'", c, token));
                }
                (end, Some((c, &token[pos + 1..end])))
            }
            '[' => {
                let close = token[pos..]
                    .find(']')
                    .map(|offset| pos + offset)
                    .ok_or_else(|| format!("unterminated attribute selector in '{}'", token))?;
                let body = &token[pos + 1..close];
                let attr = match body.split_once('=') {
                    None => (body.to_string(), None),
                    Some((name, value)) => {
                        let value = value.trim_matches(|q| q == '"' || q == '\'');
                        (name.to_string(), Some(value.to_string()))
                    }
                };
                if attr.0.is_empty() {
                    return Err(format!("empty attribute name in '{}'", token));
                }
                compound.attrs.push(attr);
                (close + 1, None)
            }
            c if pos == 0 && c.is_alphabetic() => {
                let end = ident_end(0);
                compound.tag = Some(token[..end].to_ascii_lowercase());
                (end, None)
            }
            other => return Err(format!("unsupported character '{}' in '{}'", other, token)),
        };

        match part {
            Some(('.', class)) => compound.classes.push(class.to_string()),
            Some(('#', id)) => compound.id = Some(id.to_string()),
            _ => {}
        }

        while chars.peek().is_some_and(|&(p, _)| p < end) {
            chars.next();
        }
    }

    Ok(compound)
}

// TodoMVC application model
//
// Mirrors the behaviour and markup of the TodoMVC demo the suite targets.
// Rendering rules:
// - the main section and footer exist only while there are todos
// - filtered-out items are not rendered at all
// - the clear-completed button exists only while something is completed
// - the counter reads "<n> item left" for one, "<n> items left" otherwise

use super::dom::{Element, Target};
use crate::todo_page::Filter;

pub const NEW_TODO_PLACEHOLDER: &str = "What needs to be done?";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub completed: bool,
}

/// A state change caused by a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    SetDraft(String),
    SubmitDraft,
    SetCompleted(u64, bool),
    SetAllCompleted(bool),
    SetFilter(Filter),
    ClearCompleted,
}

#[derive(Debug, Default)]
pub struct TodoMvcApp {
    todos: Vec<Todo>,
    draft: String,
    filter: Filter,
    next_id: u64,
}

impl TodoMvcApp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn active_count(&self) -> usize {
        self.todos.iter().filter(|t| !t.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.todos.len() - self.active_count()
    }

    /// Page (re)load: todos survive like local storage, the input is cleared
    /// and the route picks the filter.
    pub fn load(&mut self, filter: Filter) {
        self.draft.clear();
        self.filter = filter;
    }

    pub fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::SetDraft(text) => self.draft = text,
            Mutation::SubmitDraft => {
                let title = self.draft.trim().to_string();
                if !title.is_empty() {
                    self.next_id += 1;
                    self.todos.push(Todo {
                        id: self.next_id,
                        title,
                        completed: false,
                    });
                    self.draft.clear();
                }
            }
            Mutation::SetCompleted(id, completed) => {
                if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
                    todo.completed = completed;
                }
            }
            Mutation::SetAllCompleted(completed) => {
                for todo in &mut self.todos {
                    todo.completed = completed;
                }
            }
            Mutation::SetFilter(filter) => self.filter = filter,
            Mutation::ClearCompleted => self.todos.retain(|t| !t.completed),
        }
    }

    fn visible_todos(&self) -> impl Iterator<Item = &Todo> {
        self.todos.iter().filter(move |t| match self.filter {
            Filter::All => true,
            Filter::Active => !t.completed,
            Filter::Completed => t.completed,
        })
    }

    /// Renders the application as an element tree rooted at `<body>`.
    pub fn render(&self) -> Element {
        let mut new_todo = Element::new("input")
            .class("new-todo")
            .attr("placeholder", NEW_TODO_PLACEHOLDER)
            .target(Target::NewTodo);
        if !self.draft.is_empty() {
            new_todo = new_todo.attr("value", self.draft.clone());
        }

        let header = Element::new("header")
            .class("header")
            .child(Element::new("h1").text("todos"))
            .child(new_todo);

        let mut app = Element::new("section").class("todoapp").child(header);
        if !self.todos.is_empty() {
            app = app.child(self.render_main()).child(self.render_footer());
        }

        Element::new("body").child(app)
    }

    fn render_main(&self) -> Element {
        let mut toggle_all = Element::new("input")
            .attr("id", "toggle-all")
            .class("toggle-all")
            .attr("type", "checkbox")
            .target(Target::ToggleAll);
        if self.active_count() == 0 {
            toggle_all = toggle_all.attr("checked", "");
        }

        let items = self.visible_todos().map(|todo| {
            let mut toggle = Element::new("input")
                .class("toggle")
                .attr("type", "checkbox")
                .target(Target::Toggle(todo.id));
            if todo.completed {
                toggle = toggle.attr("checked", "");
            }

            let mut item = Element::new("li").attr("data-testid", "todo-item");
            if todo.completed {
                item = item.class("completed");
            }
            item.child(
                Element::new("div")
                    .class("view")
                    .child(toggle)
                    .child(
                        Element::new("label")
                            .attr("data-testid", "todo-title")
                            .text(todo.title.clone()),
                    )
                    .child(Element::new("button").class("destroy")),
            )
        });

        Element::new("section")
            .class("main")
            .child(toggle_all)
            .child(
                Element::new("label")
                    .attr("for", "toggle-all")
                    .text("Mark all as complete"),
            )
            .child(Element::new("ul").class("todo-list").children(items))
    }

    fn render_footer(&self) -> Element {
        let left = self.active_count();
        let word = if left == 1 { "item" } else { "items" };
        let counter = Element::new("span")
            .attr("class", "todo-count")
            .attr("data-testid", "todo-count")
            .child(Element::new("strong").text(left.to_string()))
            .text(format!(" {} left", word));

        let filters = [Filter::All, Filter::Active, Filter::Completed].map(|filter| {
            let mut link = Element::new("a")
                .attr("href", filter.route())
                .target(Target::FilterLink(filter));
            if filter == self.filter {
                link = link.class("selected");
            }
            Element::new("li").child(link.text(filter.label()))
        });

        let mut footer = Element::new("footer")
            .class("footer")
            .child(counter)
            .child(Element::new("ul").class("filters").children(filters));
        if self.completed_count() > 0 {
            footer = footer.child(
                Element::new("button")
                    .class("clear-completed")
                    .target(Target::ClearCompleted)
                    .text("Clear completed"),
            );
        }
        footer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with(titles: &[&str]) -> TodoMvcApp {
        let mut app = TodoMvcApp::new();
        for title in titles {
            app.apply(Mutation::SetDraft(title.to_string()));
            app.apply(Mutation::SubmitDraft);
        }
        app
    }

    #[test]
    fn test_submit_trims_and_ignores_blank() {
        let mut app = app_with(&["  Buy milk  "]);
        app.apply(Mutation::SetDraft("   ".to_string()));
        app.apply(Mutation::SubmitDraft);

        assert_eq!(app.todos().len(), 1);
        assert_eq!(app.todos()[0].title, "Buy milk");
    }

    #[test]
    fn test_empty_app_renders_no_footer() {
        let html = TodoMvcApp::new().render().to_html();
        assert!(html.contains(r#"placeholder="What needs to be done?""#));
        assert!(!html.contains("todo-list"));
        assert!(!html.contains("todo-count"));
    }

    #[test]
    fn test_counter_wording() {
        let mut app = app_with(&["Buy milk", "Walk the dog"]);
        assert!(app.render().to_html().contains("<strong>2</strong> items left"));

        app.apply(Mutation::SetCompleted(1, true));
        assert!(app.render().to_html().contains("<strong>1</strong> item left"));

        app.apply(Mutation::SetAllCompleted(true));
        assert!(app.render().to_html().contains("<strong>0</strong> items left"));
    }

    #[test]
    fn test_filter_and_clear_completed() {
        let mut app = app_with(&["Buy milk", "Walk the dog", "Learn Playwright"]);
        app.apply(Mutation::SetCompleted(1, true));

        app.apply(Mutation::SetFilter(Filter::Completed));
        assert_eq!(app.visible_todos().count(), 1);
        app.apply(Mutation::SetFilter(Filter::Active));
        assert_eq!(app.visible_todos().count(), 2);

        assert!(app.render().to_html().contains("Clear completed"));
        app.apply(Mutation::ClearCompleted);
        assert_eq!(app.todos().len(), 2);
        assert_eq!(app.completed_count(), 0);
        assert!(!app.render().to_html().contains("Clear completed"));
    }

    #[test]
    fn test_load_keeps_todos_and_resets_draft() {
        let mut app = app_with(&["Buy milk"]);
        app.apply(Mutation::SetDraft("half typed".to_string()));
        app.load(Filter::Completed);

        assert_eq!(app.todos().len(), 1);
        assert_eq!(app.filter(), Filter::Completed);
        assert!(!app.render().to_html().contains("half typed"));
    }
}

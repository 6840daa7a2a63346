use crate::class::Class;

/// Picks a class by id, name, long name or picker label, in that order.
#[derive(Debug, Clone)]
pub struct ClassSelector {
    selector: String,
}

impl ClassSelector {
    pub fn new(selector: String) -> Self {
        Self { selector }
    }

    pub fn as_str(&self) -> &str {
        &self.selector
    }

    pub fn select_from<'a>(&self, classes: &'a [Class]) -> Option<&'a Class> {
        self.select_as_id(classes)
            .or_else(|| self.select_as_name(classes))
            .or_else(|| self.select_as_long_name(classes))
            .or_else(|| self.select_as_label(classes))
    }

    fn select_as_id<'a>(&self, classes: &'a [Class]) -> Option<&'a Class> {
        classes
            .iter()
            .find(|class| class.id().to_string() == self.selector)
    }

    fn select_as_name<'a>(&self, classes: &'a [Class]) -> Option<&'a Class> {
        classes.iter().find(|class| class.name() == self.selector)
    }

    fn select_as_long_name<'a>(&self, classes: &'a [Class]) -> Option<&'a Class> {
        classes
            .iter()
            .find(|class| class.long_name() == self.selector)
    }

    fn select_as_label<'a>(&self, classes: &'a [Class]) -> Option<&'a Class> {
        classes.iter().find(|class| class.label() == self.selector)
    }
}

use crate::common::*;

/// The ordered list of class names. A class index points into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    classes: IndexSet<String>,
}

impl Vocabulary {
    /// Load a classes file with one class name per line.
    pub fn load<P>(path: P) -> anyhow::Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read classes file '{}'", path.display()))?;
        let lines: Vec<_> = content.lines().collect();
        let classes: IndexSet<_> = lines.iter().cloned().map(ToOwned::to_owned).collect();
        ensure!(
            lines.len() == classes.len(),
            "duplicated class names found in '{}'",
            path.display()
        );
        ensure!(!classes.is_empty(), "no classes found in '{}'", path.display());
        Ok(Self { classes })
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// The name of class `class`, if it is in range.
    pub fn name(&self, class: i32) -> Option<&str> {
        let index = usize::try_from(class).ok()?;
        self.classes.get_index(index).map(String::as_str)
    }
}

impl<S> FromIterator<S> for Vocabulary
where
    S: Into<String>,
{
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        Self {
            classes: iter.into_iter().map(Into::into).collect(),
        }
    }
}

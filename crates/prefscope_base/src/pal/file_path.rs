use relative_path::RelativePathBuf;
use std::path::Path;

/* 📖 # Why are store paths relative?

Preference files live at fixed locations below the user's home directory. The
locator produces those locations as FilePaths relative to the PAL base directory,
and only RealPal knows which directory that is. Locating a store therefore needs
no environment lookups, and MockPal can serve the same paths from memory.
*/

/// Path relative to the PAL base directory (the home directory for RealPal).
///
/// # Examples
///
/// ```
/// use prefscope_base::FilePath;
///
/// let path = FilePath::from(".config/unity3d").join("Acme").join("prefs");
/// assert_eq!(path.to_string(), ".config/unity3d/Acme/prefs");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    /// Converts to a regular Path, still relative to the base directory.
    pub fn as_path(&self) -> &Path {
        Path::new(self.0.as_str())
    }

    pub fn join(&self, component: impl AsRef<str>) -> FilePath {
        Self(self.0.join(component.as_ref()))
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

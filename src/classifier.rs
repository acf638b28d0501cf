use crate::window_info::WindowSnapshot;

/// Shell and desktop surfaces that must never be spotlighted. Matched
/// exactly (case-sensitive) against either the class name or the title.
pub const SYSTEM_SURROGATES: &[&str] = &[
    // Desktop root
    "Progman",
    "Program Manager",
    // Shell worker surface behind the desktop icons
    "WorkerW",
    // Taskbars
    "Shell_TrayWnd",
    "Shell_SecondaryTrayWnd",
    // Start menu, search and other core UI hosts
    "Windows.UI.Core.CoreWindow",
];

#[derive(Debug, Clone, Copy)]
pub struct WindowClassifier {
    deny_list: &'static [&'static str],
}

impl Default for WindowClassifier {
    fn default() -> Self {
        Self::new(SYSTEM_SURROGATES)
    }
}

impl WindowClassifier {
    pub const fn new(deny_list: &'static [&'static str]) -> Self {
        Self { deny_list }
    }

    pub fn is_system_surrogate(&self, snapshot: &WindowSnapshot) -> bool {
        self.deny_list
            .iter()
            .any(|name| *name == snapshot.class_name || *name == snapshot.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::ScreenRect;
    use crate::window_info::WindowHandle;

    fn snapshot(title: &str, class_name: &str) -> WindowSnapshot {
        WindowSnapshot {
            handle: WindowHandle(1),
            rect: ScreenRect::new(0, 0, 10, 10),
            title: title.to_string(),
            class_name: class_name.to_string(),
        }
    }

    #[test]
    fn taskbar_and_desktop_are_surrogates() {
        let classifier = WindowClassifier::default();
        assert!(classifier.is_system_surrogate(&snapshot("", "Shell_TrayWnd")));
        assert!(classifier.is_system_surrogate(&snapshot("", "Shell_SecondaryTrayWnd")));
        assert!(classifier.is_system_surrogate(&snapshot("", "WorkerW")));
        assert!(classifier.is_system_surrogate(&snapshot("Program Manager", "Whatever")));
    }

    #[test]
    fn ordinary_windows_are_not_surrogates() {
        let classifier = WindowClassifier::default();
        assert!(!classifier.is_system_surrogate(&snapshot("Untitled - Notepad", "Notepad")));
    }

    #[test]
    fn matching_is_exact_and_case_sensitive() {
        let classifier = WindowClassifier::default();
        assert!(!classifier.is_system_surrogate(&snapshot("", "shell_traywnd")));
        assert!(!classifier.is_system_surrogate(&snapshot("", "Shell_TrayWnd2")));
        assert!(!classifier.is_system_surrogate(&snapshot("My Progman notes", "Notepad")));
    }
}

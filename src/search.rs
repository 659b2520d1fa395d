//! City search with prefix autocomplete over the known city list.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub city: String,
    /// Number of leading characters that matched the input.
    pub matched: usize,
}

impl Suggestion {
    pub fn split(&self) -> (&str, &str) {
        let at = self
            .city
            .char_indices()
            .nth(self.matched)
            .map_or(self.city.len(), |(i, _)| i);
        self.city.split_at(at)
    }
}

#[derive(Debug)]
pub struct Autocomplete {
    cities: Vec<String>,
    input: String,
    suggestions: Option<Vec<Suggestion>>,
    focus: i32,
}

/// Number of `city` characters covered by a case-insensitive `prefix`, if it matches.
/// Counted on the city side since folding can change lengths ("ß" is "SS").
fn matched_prefix(city: &str, prefix: &str) -> Option<usize> {
    let mut wanted = prefix.chars().flat_map(char::to_uppercase).peekable();
    let mut count = 0;
    for c in city.chars() {
        if wanted.peek().is_none() {
            break;
        }
        for upper in c.to_uppercase() {
            match wanted.next() {
                Some(w) if w == upper => {}
                None => break,
                Some(_) => return None,
            }
        }
        count += 1;
    }
    wanted.peek().is_none().then_some(count)
}

impl Default for Autocomplete {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Autocomplete {
    pub fn new(cities: Vec<String>) -> Self {
        Self {
            cities,
            input: String::new(),
            suggestions: None,
            focus: -1,
        }
    }

    /// Swaps in a freshly loaded city list and re-filters the current input.
    pub fn set_cities(&mut self, cities: Vec<String>) {
        self.cities = cities;
        let input = std::mem::take(&mut self.input);
        self.set_input(&input);
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// `None` while the input is empty; no list is shown at all then.
    pub fn suggestions(&self) -> Option<&[Suggestion]> {
        self.suggestions.as_deref()
    }

    pub fn focus(&self) -> i32 {
        self.focus
    }

    pub fn set_input(&mut self, text: &str) {
        self.input = text.to_string();
        self.focus = -1;
        if text.is_empty() {
            self.suggestions = None;
            return;
        }
        self.suggestions = Some(
            self.cities
                .iter()
                .filter_map(|city| {
                    matched_prefix(city, text).map(|matched| Suggestion {
                        city: city.clone(),
                        matched,
                    })
                })
                .collect(),
        );
    }

    pub fn push_char(&mut self, c: char) {
        let mut text = self.input.clone();
        text.push(c);
        self.set_input(&text);
    }

    pub fn pop_char(&mut self) {
        let mut text = self.input.clone();
        text.pop();
        self.set_input(&text);
    }

    fn candidate_count(&self) -> i32 {
        self.suggestions.as_ref().map_or(0, |s| s.len() as i32)
    }

    pub fn focus_next(&mut self) {
        let n = self.candidate_count();
        if n > 0 {
            self.focus = (self.focus + 1).rem_euclid(n);
        }
    }

    pub fn focus_prev(&mut self) {
        let n = self.candidate_count();
        if n > 0 {
            self.focus = if self.focus <= 0 { n - 1 } else { self.focus - 1 };
        }
    }

    /// Commits the focused suggestion, or the raw input when nothing is focused.
    pub fn enter(&mut self) -> Option<String> {
        let focused = usize::try_from(self.focus)
            .ok()
            .and_then(|i| self.suggestions.as_ref()?.get(i))
            .map(|s| s.city.clone());
        match focused {
            Some(city) => {
                self.clear();
                Some(city)
            }
            None => self.submit(),
        }
    }

    /// Commits the input verbatim. Unknown cities are passed on as typed.
    pub fn submit(&mut self) -> Option<String> {
        if self.input.is_empty() {
            return None;
        }
        let city = std::mem::take(&mut self.input);
        self.clear();
        Some(city)
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.suggestions = None;
        self.focus = -1;
    }
}

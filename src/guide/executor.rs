use crate::dom::page::{Animator, Celebrator, Page, ScrollDirection, SelectOption};
use crate::dom::resolver::ElementResolver;
use crate::dom::snapshot::DomSnapshot;
use crate::error::Result;
use crate::guide::animator::{CLICK_GRACE, InteractionAnimator, SETTLE_DELAY};
use crate::protocol::action::{Action, ExecutionResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Where the driver sends validated actions.
///
/// Exactly one action is in flight at a time.
#[async_trait]
pub trait ActionChannel: Send {
    /// Apply one action against the snapshot the model saw
    async fn execute(&mut self, snapshot: &DomSnapshot, action: &Action) -> ExecutionResult;

    /// Remove every on-page artifact of the guide (the pointer indicator)
    async fn teardown(&mut self);
}

/// Dispatches actions to DOM effects through the page capabilities
pub struct ActionExecutor {
    page: Arc<dyn Page>,
    animator: InteractionAnimator,
    celebrator: Arc<dyn Celebrator>,
}

impl ActionExecutor {
    pub fn new(
        page: Arc<dyn Page>,
        animator: Arc<dyn Animator>,
        celebrator: Arc<dyn Celebrator>,
    ) -> Self {
        Self {
            page,
            animator: InteractionAnimator::new(animator),
            celebrator,
        }
    }

    /// Executor over a page that provides every capability itself
    pub fn for_page<P>(page: Arc<P>) -> Self
    where
        P: Page + Animator + Celebrator + 'static,
    {
        Self::new(page.clone(), page.clone(), page)
    }

    pub fn animator(&self) -> &InteractionAnimator {
        &self.animator
    }

    async fn dispatch(&mut self, snapshot: &DomSnapshot, action: &Action) -> Result<ExecutionResult> {
        match action {
            Action::Done { text, success } => {
                if *success {
                    if let Err(e) = self.celebrator.celebrate().await {
                        log::warn!("Celebration failed: {}", e);
                    }
                }
                Ok(ExecutionResult::Terminated {
                    success: *success,
                    text: text.clone(),
                })
            }
            Action::Wait { seconds } => {
                sleep(Duration::from_secs(*seconds)).await;
                Ok(ExecutionResult::Success)
            }
            Action::GoBack {} => {
                // Fire and forget
                if let Err(e) = self.page.go_back().await {
                    log::warn!("History back failed: {}", e);
                }
                Ok(ExecutionResult::Success)
            }
            Action::ScrollDown { amount } => {
                self.page.scroll_by(ScrollDirection::Down, *amount).await?;
                Ok(ExecutionResult::Success)
            }
            Action::ScrollUp { amount } => {
                self.page.scroll_by(ScrollDirection::Up, *amount).await?;
                Ok(ExecutionResult::Success)
            }
            Action::ClickElement { index, xpath } => {
                if let Some(xpath) = xpath {
                    log::debug!("Ignoring model-supplied xpath {} for index {}", xpath, index);
                }
                self.click(snapshot, *index).await
            }
            Action::InputText { index, text, .. } => self.type_text(snapshot, *index, text, true).await,
            Action::SendKeys { index, text } => self.type_text(snapshot, *index, text, false).await,
            Action::ScrollToElement { index } => self.scroll_to(snapshot, *index).await,
            Action::GetDropdownOptions { index } => self.dropdown_options(snapshot, *index).await,
            Action::SelectDropdownOption { index, text } => self.select_option(snapshot, *index, text).await,
            Action::Unsupported { name } => {
                log::warn!("Unsupported action '{}'", name);
                Ok(ExecutionResult::Failure)
            }
        }
    }

    /// Entry check shared by every indexed action; the animator is never
    /// touched for an index the snapshot does not contain
    fn has_entry(snapshot: &DomSnapshot, index: usize) -> bool {
        let present = snapshot.element(index).is_some();
        if !present {
            log::debug!("Index {} is not in snapshot {:?}", index, snapshot.id);
        }
        present
    }

    async fn click(&mut self, snapshot: &DomSnapshot, index: usize) -> Result<ExecutionResult> {
        if !Self::has_entry(snapshot, index) {
            return Ok(ExecutionResult::Failure);
        }

        self.animator.create_indicator().await?;
        sleep(CLICK_GRACE).await;

        let resolver = ElementResolver::new(self.page.as_ref(), snapshot);
        let Some(element) = self.animator.move_to_and_settle(&resolver, index).await? else {
            return Ok(ExecutionResult::Failure);
        };

        Ok(ExecutionResult::from_bool(self.page.click(&element.xpath).await?))
    }

    /// Keystroke-level typing; `replace` clears the field first and requires
    /// a text-capable input or textarea
    async fn type_text(
        &mut self,
        snapshot: &DomSnapshot,
        index: usize,
        text: &str,
        replace: bool,
    ) -> Result<ExecutionResult> {
        if !Self::has_entry(snapshot, index) {
            return Ok(ExecutionResult::Failure);
        }

        let resolver = ElementResolver::new(self.page.as_ref(), snapshot);
        let Some(element) = self.animator.move_to_and_settle(&resolver, index).await? else {
            return Ok(ExecutionResult::Failure);
        };

        if replace {
            if !element.handle.accepts_text() {
                log::debug!(
                    "Element {} is a <{}>, which does not accept text",
                    index,
                    element.handle.tag_name
                );
                return Ok(ExecutionResult::Failure);
            }
            if !self.page.clear(&element.xpath).await? {
                return Ok(ExecutionResult::Failure);
            }
        }

        for key in text.chars() {
            if !self.page.send_key(&element.xpath, key).await? {
                return Ok(ExecutionResult::Failure);
            }
        }
        Ok(ExecutionResult::Success)
    }

    async fn scroll_to(&mut self, snapshot: &DomSnapshot, index: usize) -> Result<ExecutionResult> {
        if !Self::has_entry(snapshot, index) {
            return Ok(ExecutionResult::Failure);
        }

        let resolver = ElementResolver::new(self.page.as_ref(), snapshot);
        let Some(element) = resolver.resolve(index).await? else {
            return Ok(ExecutionResult::Failure);
        };

        self.page.scroll_into_view(&element.xpath).await?;
        sleep(SETTLE_DELAY).await;

        Ok(ExecutionResult::from_bool(resolver.resolve(index).await?.is_some()))
    }

    async fn dropdown_options(&mut self, snapshot: &DomSnapshot, index: usize) -> Result<ExecutionResult> {
        if !Self::has_entry(snapshot, index) {
            return Ok(ExecutionResult::Failure);
        }

        let resolver = ElementResolver::new(self.page.as_ref(), snapshot);
        let Some(element) = resolver.resolve(index).await? else {
            return Ok(ExecutionResult::Failure);
        };
        if !element.handle.is_native_select() {
            return Ok(ExecutionResult::Failure);
        }

        let labels: Vec<&str> = element
            .handle
            .options
            .iter()
            .map(|option| option.label.trim())
            .collect();
        Ok(ExecutionResult::Text(labels.join(", ")))
    }

    async fn select_option(
        &mut self,
        snapshot: &DomSnapshot,
        index: usize,
        text: &str,
    ) -> Result<ExecutionResult> {
        if !Self::has_entry(snapshot, index) {
            return Ok(ExecutionResult::Failure);
        }

        let is_native = {
            let resolver = ElementResolver::new(self.page.as_ref(), snapshot);
            match resolver.resolve(index).await? {
                Some(element) => element.handle.is_native_select(),
                None => return Ok(ExecutionResult::Failure),
            }
        };

        if !is_native {
            log::debug!("Element {} is not a native select, clicking it instead", index);
            return self.click(snapshot, index).await;
        }

        let resolver = ElementResolver::new(self.page.as_ref(), snapshot);
        let Some(element) = self.animator.move_to_and_settle(&resolver, index).await? else {
            return Ok(ExecutionResult::Failure);
        };

        let Some(option) = find_option(&element.handle.options, text) else {
            log::debug!("No option matching '{}' in element {}", text, index);
            return Ok(ExecutionResult::Failure);
        };

        Ok(ExecutionResult::from_bool(
            self.page.select_value(&element.xpath, &option.value).await?,
        ))
    }
}

/// Match by trimmed visible text, then by exact value
fn find_option<'a>(options: &'a [SelectOption], text: &str) -> Option<&'a SelectOption> {
    let wanted = text.trim();
    options
        .iter()
        .find(|option| option.label.trim() == wanted)
        .or_else(|| options.iter().find(|option| option.value == text))
}

#[async_trait]
impl ActionChannel for ActionExecutor {
    async fn execute(&mut self, snapshot: &DomSnapshot, action: &Action) -> ExecutionResult {
        log::debug!("Executing {}", action);
        match self.dispatch(snapshot, action).await {
            Ok(result) => result,
            Err(e) => {
                log::warn!("Action {} failed: {}", action, e);
                ExecutionResult::Failure
            }
        }
    }

    async fn teardown(&mut self) {
        self.animator.destroy().await;
    }
}

use crate::types::errors::HostError;
use crate::types::tab::{GroupColor, GroupId, GroupUpdate, TabGroup, TabId, TabInfo, TabStatus};

/// Trait defining the host tab / tab-group API the pipeline drives.
pub trait TabHost {
    fn query_tabs(&self) -> Vec<TabInfo>;
    fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError>;
    /// Groups the given tabs into a new group and returns its id.
    fn group_tabs(&mut self, tab_ids: &[TabId]) -> Result<GroupId, HostError>;
    fn update_group(&mut self, group_id: GroupId, update: &GroupUpdate) -> Result<TabGroup, HostError>;
    fn query_groups(&self) -> Vec<TabGroup>;
    fn tabs_in_group(&self, group_id: GroupId) -> Vec<TabInfo>;
    /// Closes the given tabs in one call. Returns the ids that could not be closed.
    fn remove_tabs(&mut self, tab_ids: &[TabId]) -> Vec<(TabId, HostError)>;
}

/// In-memory mirror of the browser's tabs and tab groups.
///
/// Ids are assigned from monotonically increasing counters, like the host does.
/// Groups are kept when their last tab leaves; reclaiming them is the reaper's job.
pub struct TabManager {
    tabs: Vec<TabInfo>,
    groups: Vec<TabGroup>,
    next_tab_id: TabId,
    next_group_id: GroupId,
}

impl TabManager {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            groups: Vec::new(),
            next_tab_id: 1,
            next_group_id: 1,
        }
    }

    fn find_tab_index(&self, tab_id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }

    fn find_group_index(&self, group_id: GroupId) -> Option<usize> {
        self.groups.iter().position(|g| g.id == group_id)
    }

    /// Opens a tab and returns its id. The first tab is always active.
    pub fn open_tab(&mut self, url: &str, title: &str, active: bool) -> TabId {
        let id = self.next_tab_id;
        self.next_tab_id += 1;

        let make_active = active || self.tabs.is_empty();
        if make_active {
            for tab in &mut self.tabs {
                tab.active = false;
            }
        }

        self.tabs.push(TabInfo {
            id,
            url: url.to_string(),
            title: title.to_string(),
            status: TabStatus::Loading,
            active: make_active,
            group_id: None,
        });
        id
    }

    /// Applies navigation / load progress to a tab.
    pub fn update_tab(
        &mut self,
        tab_id: TabId,
        url: Option<&str>,
        title: Option<&str>,
        status: Option<TabStatus>,
    ) -> Result<TabInfo, HostError> {
        let idx = self
            .find_tab_index(tab_id)
            .ok_or(HostError::TabNotFound(tab_id))?;
        let tab = &mut self.tabs[idx];
        if let Some(url) = url {
            tab.url = url.to_string();
        }
        if let Some(title) = title {
            tab.title = title.to_string();
        }
        if let Some(status) = status {
            tab.status = status;
        }
        Ok(tab.clone())
    }

    /// Makes the given tab the active one.
    pub fn activate_tab(&mut self, tab_id: TabId) -> Result<(), HostError> {
        if self.find_tab_index(tab_id).is_none() {
            return Err(HostError::TabNotFound(tab_id));
        }
        for tab in &mut self.tabs {
            tab.active = tab.id == tab_id;
        }
        Ok(())
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    pub fn get_active_tab(&self) -> Option<&TabInfo> {
        self.tabs.iter().find(|t| t.active)
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TabHost for TabManager {
    fn query_tabs(&self) -> Vec<TabInfo> {
        self.tabs.clone()
    }

    fn get_tab(&self, tab_id: TabId) -> Result<TabInfo, HostError> {
        self.tabs
            .iter()
            .find(|t| t.id == tab_id)
            .cloned()
            .ok_or(HostError::TabNotFound(tab_id))
    }

    /// Fails as a whole when any id is unknown, matching the host API.
    fn group_tabs(&mut self, tab_ids: &[TabId]) -> Result<GroupId, HostError> {
        if tab_ids.is_empty() {
            return Err(HostError::InvalidRequest("no tabs to group".to_string()));
        }
        if let Some(missing) = tab_ids.iter().find(|id| self.find_tab_index(**id).is_none()) {
            return Err(HostError::TabNotFound(*missing));
        }

        let group_id = self.next_group_id;
        self.next_group_id += 1;
        self.groups.push(TabGroup {
            id: group_id,
            title: String::new(),
            color: GroupColor::Grey,
            collapsed: false,
        });

        for tab in self.tabs.iter_mut().filter(|t| tab_ids.contains(&t.id)) {
            tab.group_id = Some(group_id);
        }
        Ok(group_id)
    }

    fn update_group(&mut self, group_id: GroupId, update: &GroupUpdate) -> Result<TabGroup, HostError> {
        let idx = self
            .find_group_index(group_id)
            .ok_or(HostError::GroupNotFound(group_id))?;
        let group = &mut self.groups[idx];
        if let Some(title) = &update.title {
            group.title = title.clone();
        }
        if let Some(color) = update.color {
            group.color = color;
        }
        if let Some(collapsed) = update.collapsed {
            group.collapsed = collapsed;
        }
        Ok(group.clone())
    }

    fn query_groups(&self) -> Vec<TabGroup> {
        self.groups.clone()
    }

    fn tabs_in_group(&self, group_id: GroupId) -> Vec<TabInfo> {
        self.tabs
            .iter()
            .filter(|t| t.group_id == Some(group_id))
            .cloned()
            .collect()
    }

    fn remove_tabs(&mut self, tab_ids: &[TabId]) -> Vec<(TabId, HostError)> {
        let mut failures = Vec::new();
        for &id in tab_ids {
            match self.find_tab_index(id) {
                Some(idx) => {
                    self.tabs.remove(idx);
                }
                None => failures.push((id, HostError::TabNotFound(id))),
            }
        }

        if !self.tabs.is_empty() && self.get_active_tab().is_none() {
            self.tabs[0].active = true;
        }
        failures
    }
}

use async_trait::async_trait;

use crate::error::Error;
use crate::error::Result;
use crate::message::types::ConfirmDelete;
use crate::message::types::Delete;
use crate::message::types::FindNewNeighbour;
use crate::message::types::FoundNewNeighbour;
use crate::message::types::NoNeighbour;
use crate::message::types::SetNeighbourNil;
use crate::message::HandleMsg;
use crate::message::Message;
use crate::message::MessageHandler;
use crate::message::MessagePayload;
use crate::pending::RequestCategory;
use crate::skipgraph::NodeInfo;
use crate::skipgraph::SGNode;
use crate::skipgraph::Side;

impl MessageHandler {
    /// Remove the local member from the graph, top level first.
    ///
    /// Every level is repaired before the next lower one starts. When the
    /// right neighbour cannot take over the repair, the left neighbour is told
    /// to drop us instead. A right neighbour that cannot be reached is also
    /// dropped from the lower levels. Returns whether every step was
    /// confirmed. The routing table is discarded in any case.
    pub async fn leave(&self) -> Result<bool> {
        let height = self.graph.height()?;
        self.graph.set_leaving(true);
        tracing::info!(
            "Node {} leaving, repairing {} levels",
            self.graph.short_id(),
            height
        );

        let mut confirmed = true;
        for level in (0..height).rev() {
            if let Some(right) = self.graph.get(level, Side::Right)? {
                match self.request_delete(&right, level).await {
                    Ok(true) => continue,
                    Ok(false) => {}
                    Err(e) => {
                        tracing::warn!("Delete at level {} to {} failed: {}", level, right, e);
                        confirmed = false;
                        if matches!(e, Error::Transport(_)) {
                            let removed = self
                                .graph
                                .with_table(|t| Ok(t.remove_node(right.key)))?;
                            tracing::debug!("Dropped unreachable {} from {} slots", right, removed);
                        }
                    }
                }
            }
            if let Some(left) = self.graph.get(level, Side::Left)? {
                match self.set_neighbour_nil(&left, level).await {
                    Ok(ok) => confirmed &= ok,
                    Err(e) => {
                        tracing::warn!(
                            "SetNeighbourNil at level {} to {} failed: {}",
                            level,
                            left,
                            e
                        );
                        confirmed = false;
                    }
                }
            }
        }

        self.graph.discard()?;
        tracing::info!("Node {} left the skip graph", self.graph.short_id());
        Ok(confirmed)
    }

    /// Tell `right` that the local member leaves `level`.
    /// `Ok(false)` means `right` found nobody to its right that stays.
    pub async fn request_delete(&self, right: &SGNode, level: usize) -> Result<bool> {
        let originator = self.my_node()?.to_wire();
        self.request_confirm(RequestCategory::Delete, right, |id| {
            Message::Delete(Delete {
                id,
                originator,
                level,
            })
        })
        .await
    }

    /// Tell `left` to clear its right slot at `level`.
    pub async fn set_neighbour_nil(&self, left: &SGNode, level: usize) -> Result<bool> {
        let originator = self.my_node()?.to_wire();
        self.request_confirm(RequestCategory::SetNeighbourNil, left, |id| {
            Message::SetNeighbourNil(SetNeighbourNil {
                id,
                originator,
                level,
            })
        })
        .await
    }

    /// Walk left from our left neighbour at `level` for the first member that stays.
    /// Any failure is logged and reported as no neighbour.
    pub async fn find_new_neighbour(&self, level: usize) -> Option<SGNode> {
        let left = match self.graph.get(level, Side::Left) {
            Ok(Some(left)) => left,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read left neighbour at level {}: {}", level, e);
                return None;
            }
        };
        let originator = match self.my_node() {
            Ok(me) => me.to_wire(),
            Err(e) => {
                tracing::warn!("Failed to look for a new neighbour: {}", e);
                return None;
            }
        };
        let res = self
            .request_node(RequestCategory::FindNewNeighbour, &left, |id| {
                Message::FindNewNeighbour(FindNewNeighbour {
                    id,
                    originator,
                    level,
                })
            })
            .await;
        match res {
            Ok(node) => node,
            Err(e) => {
                tracing::warn!("FindNewNeighbour at level {} failed: {}", level, e);
                None
            }
        }
    }

    async fn send_confirm_delete(&self, id: u32, to: &NodeInfo, level: usize) -> Result<()> {
        let msg = Message::ConfirmDelete(ConfirmDelete { id, level });
        self.transport.send_message(msg, &to.address).await
    }

    /// Whether repair requests should be passed on rather than served.
    fn passes_repairs(&self) -> Result<bool> {
        Ok(self.graph.is_leaving() || self.graph.has_departed()?)
    }

    /// Forward a repair request to our neighbour on `side`, if there is one.
    /// A member that already left uses the neighbours it had when leaving.
    async fn forward_to(&self, side: Side, level: usize, msg: Message) -> Result<bool> {
        match self.graph.last_known(level, side)? {
            Some(next) => {
                self.transport.send_message(msg, &next.address).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl HandleMsg<Delete> for MessageHandler {
    async fn handle(&self, _ctx: &MessagePayload, msg: &Delete) -> Result<()> {
        if self.passes_repairs()? {
            let forwarded = self
                .forward_to(Side::Right, msg.level, Message::Delete(msg.clone()))
                .await?;
            if !forwarded {
                let resp = Message::NoNeighbour(NoNeighbour {
                    id: msg.id,
                    level: msg.level,
                });
                self.transport
                    .send_message(resp, &msg.originator.address)
                    .await?;
            }
            return Ok(());
        }

        if !self.accepts("delete")? {
            return Ok(());
        }
        let new_left = self.find_new_neighbour(msg.level).await;
        tracing::debug!(
            "Node {} replaces left neighbour at level {} with {:?}",
            self.graph.short_id(),
            msg.level,
            new_left
        );
        self.graph.set(msg.level, Side::Left, new_left)?;
        self.send_confirm_delete(msg.id, &msg.originator, msg.level)
            .await
    }
}

#[async_trait]
impl HandleMsg<FindNewNeighbour> for MessageHandler {
    async fn handle(&self, _ctx: &MessagePayload, msg: &FindNewNeighbour) -> Result<()> {
        if self.passes_repairs()? {
            let forwarded = self
                .forward_to(Side::Left, msg.level, Message::FindNewNeighbour(msg.clone()))
                .await?;
            if !forwarded {
                let resp = Message::FoundNewNeighbour(FoundNewNeighbour {
                    id: msg.id,
                    neighbour: NodeInfo::empty(),
                    level: msg.level,
                });
                self.transport
                    .send_message(resp, &msg.originator.address)
                    .await?;
            }
            return Ok(());
        }

        if !self.accepts("find-new-neighbour")? {
            return Ok(());
        }
        let originator = SGNode::from_wire(&msg.originator)?;
        self.graph.set(msg.level, Side::Right, Some(originator))?;
        let resp = Message::FoundNewNeighbour(FoundNewNeighbour {
            id: msg.id,
            neighbour: self.my_node()?.to_wire(),
            level: msg.level,
        });
        self.transport
            .send_message(resp, &msg.originator.address)
            .await
    }
}

#[async_trait]
impl HandleMsg<SetNeighbourNil> for MessageHandler {
    async fn handle(&self, _ctx: &MessagePayload, msg: &SetNeighbourNil) -> Result<()> {
        if self.passes_repairs()? {
            let forwarded = self
                .forward_to(Side::Left, msg.level, Message::SetNeighbourNil(msg.clone()))
                .await?;
            if !forwarded {
                self.send_confirm_delete(msg.id, &msg.originator, msg.level)
                    .await?;
            }
            return Ok(());
        }

        if !self.accepts("set-neighbour-nil")? {
            return Ok(());
        }
        // only clear the slot if it still points at the leaving member
        let leaving = msg.originator.key;
        self.graph.with_table(|t| {
            if t.get(msg.level, Side::Right).map(|n| n.key) == Some(leaving) {
                t.set(msg.level, Side::Right, None)?;
            }
            Ok(())
        })?;
        self.send_confirm_delete(msg.id, &msg.originator, msg.level)
            .await
    }
}

#[async_trait]
impl HandleMsg<NoNeighbour> for MessageHandler {
    async fn handle(&self, _ctx: &MessagePayload, msg: &NoNeighbour) -> Result<()> {
        self.requests
            .confirms
            .resolve(RequestCategory::Delete, msg.id, false);
        Ok(())
    }
}

#[async_trait]
impl HandleMsg<ConfirmDelete> for MessageHandler {
    async fn handle(&self, _ctx: &MessagePayload, msg: &ConfirmDelete) -> Result<()> {
        let entry = self
            .requests
            .confirms
            .take(RequestCategory::Delete, msg.id)
            .or_else(|| {
                self.requests
                    .confirms
                    .take(RequestCategory::SetNeighbourNil, msg.id)
            });
        match entry {
            Some(entry) => {
                entry.resolve(true);
            }
            None => tracing::warn!("ConfirmDelete with unknown id {} dropped", msg.id),
        }
        Ok(())
    }
}

#[async_trait]
impl HandleMsg<FoundNewNeighbour> for MessageHandler {
    async fn handle(&self, _ctx: &MessagePayload, msg: &FoundNewNeighbour) -> Result<()> {
        let neighbour = msg.neighbour.to_option()?;
        self.requests
            .nodes
            .resolve(RequestCategory::FindNewNeighbour, msg.id, neighbour);
        Ok(())
    }
}

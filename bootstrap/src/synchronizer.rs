//! Causal-order block delivery engine.
//!
//! Given a root block hash, delivers the root and every unmet predecessor
//! oldest-first, each at most once per session. Chains can be millions of
//! blocks deep, so the walk keeps an explicit stack instead of recursing.
//!
//! The engine is generic over a [`SyncSource`] capability: the pull flow
//! reads candidates from the staging area and is done when the main block
//! table has a hash; the push flow reads the main table and is done when
//! the peer is known to have a hash.

use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use weave_ledger::Block;
use weave_store::{LedgerStore, ReadTxn, StoreError, WriteTxn};
use weave_types::BlockHash;

/// Why a synchronize walk stopped early.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A predecessor could not be retrieved; the chain is abandoned.
    #[error("missing dependency {0}")]
    MissingDependency(BlockHash),

    /// The delivery target refused a block; the chain is abandoned.
    #[error("block {0} rejected by target")]
    Rejected(BlockHash),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Where a synchronizer looks blocks up.
pub trait SyncSource {
    /// Is this hash already at the destination?
    fn synchronized(&self, txn: &ReadTxn<'_>, hash: &BlockHash) -> Result<bool, StoreError>;

    /// Fetch a candidate block to inspect its predecessor.
    fn retrieve(&self, txn: &ReadTxn<'_>, hash: &BlockHash) -> Result<Option<Block>, StoreError>;
}

pub struct BlockSynchronizer<S> {
    source: S,
    /// LIFO stack of hashes pending delivery.
    blocks: Vec<BlockHash>,
    /// Hashes already delivered this session.
    sent: HashSet<BlockHash>,
}

impl<S: SyncSource> BlockSynchronizer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            blocks: Vec::new(),
            sent: HashSet::new(),
        }
    }

    /// Prime the stack with a root to deliver.
    pub fn queue(&mut self, root: BlockHash) {
        self.blocks.push(root);
    }

    pub fn is_drained(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Abandon whatever is still stacked; delivery history is kept so an
    /// abandoned chain's blocks are not re-sent through another root.
    pub fn reset(&mut self) {
        self.blocks.clear();
    }

    /// True when the block's causal predecessor needs no delivery.
    fn add_dependency(&mut self, txn: &ReadTxn<'_>, block: &Block) -> Result<bool, StoreError> {
        let dependency = block.dependency();
        if dependency.is_zero()
            || self.sent.contains(&dependency)
            || self.source.synchronized(txn, &dependency)?
        {
            return Ok(true);
        }
        self.blocks.push(dependency);
        Ok(false)
    }

    /// Descend from the top of the stack until a leaf is on top.
    fn fill_dependencies(&mut self, txn: &ReadTxn<'_>) -> Result<(), SyncError> {
        loop {
            let Some(top) = self.blocks.last().copied() else {
                return Ok(());
            };
            let Some(block) = self.source.retrieve(txn, &top)? else {
                return Err(SyncError::MissingDependency(top));
            };
            if self.add_dependency(txn, &block)? {
                return Ok(());
            }
        }
    }

    /// Pop and return the next block in causal order, or `None` when the
    /// stack is drained.
    pub fn synchronize_one(&mut self, txn: &ReadTxn<'_>) -> Result<Option<Block>, SyncError> {
        while !self.blocks.is_empty() {
            self.fill_dependencies(txn)?;
            let Some(hash) = self.blocks.pop() else {
                break;
            };
            if !self.sent.insert(hash) {
                // Already delivered through another chain sharing this tail.
                continue;
            }
            let Some(block) = self.source.retrieve(txn, &hash)? else {
                return Err(SyncError::MissingDependency(hash));
            };
            return Ok(Some(block));
        }
        Ok(None)
    }

    /// Deliver `root` and all of its unmet predecessors to `target`,
    /// oldest first.
    pub fn synchronize<'env, F>(
        &mut self,
        txn: &mut WriteTxn<'env>,
        root: BlockHash,
        mut target: F,
    ) -> Result<(), SyncError>
    where
        F: FnMut(&mut WriteTxn<'env>, &Block) -> Result<(), SyncError>,
    {
        self.queue(root);
        while let Some(block) = self.synchronize_one(txn)? {
            target(&mut *txn, &block)?;
        }
        Ok(())
    }
}

/// Pull flow: candidates come from the staging area filled by the wire;
/// the destination is the main block table.
pub struct PullSource {
    store: Arc<LedgerStore>,
}

impl PullSource {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }
}

impl SyncSource for PullSource {
    fn synchronized(&self, txn: &ReadTxn<'_>, hash: &BlockHash) -> Result<bool, StoreError> {
        self.store.block_exists(txn, hash)
    }

    fn retrieve(&self, txn: &ReadTxn<'_>, hash: &BlockHash) -> Result<Option<Block>, StoreError> {
        match self.store.staged_get(txn, hash)? {
            Some(bytes) => Block::from_wire(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }
}

/// Push flow: candidates come from the main block table; the destination
/// is the peer, which is known to have exactly the heads it advertised
/// during the frontier exchange.
pub struct PushSource {
    store: Arc<LedgerStore>,
    known_to_peer: HashSet<BlockHash>,
}

impl PushSource {
    pub fn new(store: Arc<LedgerStore>, known_to_peer: HashSet<BlockHash>) -> Self {
        Self {
            store,
            known_to_peer,
        }
    }
}

impl SyncSource for PushSource {
    fn synchronized(&self, _txn: &ReadTxn<'_>, hash: &BlockHash) -> Result<bool, StoreError> {
        Ok(self.known_to_peer.contains(hash))
    }

    fn retrieve(&self, txn: &ReadTxn<'_>, hash: &BlockHash) -> Result<Option<Block>, StoreError> {
        match self.store.block_get(txn, hash)? {
            Some((_account, bytes)) => Block::from_wire(&bytes)
                .map(Some)
                .map_err(|e| StoreError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }
}

pub type PullSynchronizer = BlockSynchronizer<PullSource>;
pub type PushSynchronizer = BlockSynchronizer<PushSource>;

#[cfg(test)]
mod tests {
    use super::*;
    use weave_ledger::{OpenBlock, SendBlock};
    use weave_types::{Account, Signature};

    fn temp_store() -> (tempfile::TempDir, Arc<LedgerStore>) {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = LedgerStore::open(dir.path(), 64 * 1024 * 1024).expect("open store");
        (dir, Arc::new(store))
    }

    fn open_block(account_seed: u8, source: BlockHash) -> Block {
        Block::Open(OpenBlock {
            source,
            representative: Account::new([account_seed; 32]),
            account: Account::new([account_seed; 32]),
            signature: Signature([0; 64]),
            work: 0,
        })
    }

    fn send_block(previous: BlockHash, balance: u128) -> Block {
        Block::Send(SendBlock {
            previous,
            destination: Account::new([0xEE; 32]),
            balance,
            signature: Signature([0; 64]),
            work: 0,
        })
    }

    /// Build a chain of `len` blocks (open + sends) and return it oldest
    /// first.
    fn chain(account_seed: u8, len: usize) -> Vec<Block> {
        let mut blocks = vec![open_block(account_seed, BlockHash::ZERO)];
        for i in 1..len {
            let previous = blocks[i - 1].hash();
            blocks.push(send_block(previous, i as u128));
        }
        blocks
    }

    fn stage_all(store: &LedgerStore, blocks: &[Block]) {
        let mut txn = store.write_txn().unwrap();
        for block in blocks {
            store
                .staged_put(&mut txn, &block.hash(), &block.to_wire())
                .unwrap();
        }
        txn.commit().unwrap();
    }

    fn store_all(store: &LedgerStore, account: &Account, blocks: &[Block]) {
        let mut txn = store.write_txn().unwrap();
        for block in blocks {
            store
                .block_put(&mut txn, &block.hash(), account, &block.to_wire())
                .unwrap();
        }
        txn.commit().unwrap();
    }

    /// Drain a pull synchronizer from `root`, collecting delivered hashes.
    fn drain_pull(store: &Arc<LedgerStore>, root: BlockHash) -> Result<Vec<BlockHash>, SyncError> {
        let mut synchronizer = BlockSynchronizer::new(PullSource::new(Arc::clone(store)));
        let mut delivered = Vec::new();
        let mut txn = store.write_txn().unwrap();
        synchronizer.synchronize(&mut txn, root, |_txn, block| {
            delivered.push(block.hash());
            Ok(())
        })?;
        Ok(delivered)
    }

    #[test]
    fn delivers_a_staged_chain_oldest_first() {
        let (_dir, store) = temp_store();
        let blocks = chain(1, 4);
        stage_all(&store, &blocks);

        let delivered = drain_pull(&store, blocks[3].hash()).unwrap();
        let expected: Vec<BlockHash> = blocks.iter().map(Block::hash).collect();
        assert_eq!(delivered, expected);
    }

    #[test]
    fn stops_descending_at_blocks_already_stored() {
        let (_dir, store) = temp_store();
        let blocks = chain(1, 4);
        // First two blocks are already in the ledger; only the rest is staged.
        store_all(&store, &Account::new([1; 32]), &blocks[..2]);
        stage_all(&store, &blocks[2..]);

        let delivered = drain_pull(&store, blocks[3].hash()).unwrap();
        assert_eq!(delivered, vec![blocks[2].hash(), blocks[3].hash()]);
    }

    #[test]
    fn missing_dependency_aborts_the_walk() {
        let (_dir, store) = temp_store();
        let blocks = chain(1, 3);
        // The middle block never arrived.
        stage_all(&store, &[blocks[2].clone()]);

        let err = drain_pull(&store, blocks[2].hash()).unwrap_err();
        match err {
            SyncError::MissingDependency(hash) => assert_eq!(hash, blocks[1].hash()),
            other => panic!("expected MissingDependency, got {other:?}"),
        }
    }

    #[test]
    fn target_rejection_aborts_the_walk() {
        let (_dir, store) = temp_store();
        let blocks = chain(1, 3);
        stage_all(&store, &blocks);

        let mut synchronizer = BlockSynchronizer::new(PullSource::new(Arc::clone(&store)));
        let mut delivered = 0usize;
        let mut txn = store.write_txn().unwrap();
        let result = synchronizer.synchronize(&mut txn, blocks[2].hash(), |_txn, block| {
            delivered += 1;
            if delivered == 2 {
                Err(SyncError::Rejected(block.hash()))
            } else {
                Ok(())
            }
        });
        assert!(matches!(result, Err(SyncError::Rejected(_))));
        assert_eq!(delivered, 2);
    }

    #[test]
    fn shared_tail_is_delivered_once() {
        let (_dir, store) = temp_store();
        let account = Account::new([1; 32]);
        let blocks = chain(1, 3);
        store_all(&store, &account, &blocks);

        // Two roots over the same chain: everything below the first root
        // must not be re-sent for the second.
        let mut synchronizer =
            BlockSynchronizer::new(PushSource::new(Arc::clone(&store), HashSet::new()));
        let txn = store.read_txn().unwrap();

        synchronizer.queue(blocks[1].hash());
        let mut delivered = Vec::new();
        while let Some(block) = synchronizer.synchronize_one(&txn).unwrap() {
            delivered.push(block.hash());
        }
        assert_eq!(delivered, vec![blocks[0].hash(), blocks[1].hash()]);

        synchronizer.queue(blocks[2].hash());
        let mut delivered = Vec::new();
        while let Some(block) = synchronizer.synchronize_one(&txn).unwrap() {
            delivered.push(block.hash());
        }
        assert_eq!(delivered, vec![blocks[2].hash()]);
    }

    #[test]
    fn push_walk_stops_at_peer_known_head() {
        let (_dir, store) = temp_store();
        let account = Account::new([1; 32]);
        let blocks = chain(1, 5);
        store_all(&store, &account, &blocks);

        // The peer advertised blocks[2] as its head for this account.
        let known: HashSet<BlockHash> = [blocks[2].hash()].into_iter().collect();
        let mut synchronizer = BlockSynchronizer::new(PushSource::new(Arc::clone(&store), known));
        let txn = store.read_txn().unwrap();

        synchronizer.queue(blocks[4].hash());
        let mut delivered = Vec::new();
        while let Some(block) = synchronizer.synchronize_one(&txn).unwrap() {
            delivered.push(block.hash());
        }
        assert_eq!(delivered, vec![blocks[3].hash(), blocks[4].hash()]);
    }

    #[test]
    fn open_source_is_walked_before_the_open() {
        let (_dir, store) = temp_store();
        // Account 2's open is funded by a send on account 1's chain.
        let funding = chain(1, 2);
        let open2 = open_block(2, funding[1].hash());
        let mut staged = funding.clone();
        staged.push(open2.clone());
        stage_all(&store, &staged);

        let delivered = drain_pull(&store, open2.hash()).unwrap();
        assert_eq!(
            delivered,
            vec![funding[0].hash(), funding[1].hash(), open2.hash()]
        );
    }

    #[test]
    fn deep_chain_does_not_recurse() {
        let (_dir, store) = temp_store();
        let blocks = chain(1, 10_000);
        stage_all(&store, &blocks);

        let delivered = drain_pull(&store, blocks.last().unwrap().hash()).unwrap();
        assert_eq!(delivered.len(), blocks.len());
        assert_eq!(delivered.first(), Some(&blocks[0].hash()));
        assert_eq!(delivered.last(), Some(&blocks.last().unwrap().hash()));
    }

    #[test]
    fn reset_abandons_pending_work_but_keeps_history() {
        let (_dir, store) = temp_store();
        let account = Account::new([1; 32]);
        let blocks = chain(1, 3);
        store_all(&store, &account, &blocks);

        let mut synchronizer =
            BlockSynchronizer::new(PushSource::new(Arc::clone(&store), HashSet::new()));
        let txn = store.read_txn().unwrap();

        synchronizer.queue(blocks[2].hash());
        let first = synchronizer.synchronize_one(&txn).unwrap().unwrap();
        assert_eq!(first.hash(), blocks[0].hash());

        synchronizer.reset();
        assert!(synchronizer.is_drained());
        assert!(synchronizer.synchronize_one(&txn).unwrap().is_none());

        // Re-queue: the already-delivered open is not re-sent.
        synchronizer.queue(blocks[2].hash());
        let next = synchronizer.synchronize_one(&txn).unwrap().unwrap();
        assert_eq!(next.hash(), blocks[1].hash());
    }
}

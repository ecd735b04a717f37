//! Integration tests for batch execution.

#[cfg(test)]
mod integration_tests {
    use alloy::primitives::{address, b256, bytes, Address, Bytes, B256, U256};
    use ledgervm_common::{
        ether::address::{contract_address, nested_contract_address},
        ledger::{OutPoint, Script, TxIn, TxOut},
        utils::strings::decode_hex,
    };
    use ledgervm_config::ChainParams;
    use ledgervm_executor::{
        replay::{Effect, ReplayInterpreter, ReplayScript},
        BatchExecutor, Error, ExecutedBatch, ExecutionOutcome, GasAccountant, Interpreter, Status,
        TransactionException, VmTransaction,
    };
    use ledgervm_state::VmState;

    const GAS_LIMIT: u64 = 500_000;
    const SENDER: Address = address!("0101010101010101010101010101010101010101");
    const BENEFICIARY: Address = address!("4de45add9f5f0b6887081cfcfe3aca6da9eb3365");
    const HASHTX: B256 = b256!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");

    fn hex(contents: &str) -> Bytes {
        Bytes::from(decode_hex(contents.trim()).expect("invalid testdata"))
    }

    fn payable() -> Bytes {
        hex(include_str!("testdata/payable.hex"))
    }
    fn payable_runtime() -> Bytes {
        hex(include_str!("testdata/payable_runtime.hex"))
    }
    fn constructor_loop() -> Bytes {
        hex(include_str!("testdata/constructor_loop.hex"))
    }
    fn fallback_loop() -> Bytes {
        hex(include_str!("testdata/fallback_loop.hex"))
    }
    fn fallback_loop_runtime() -> Bytes {
        hex(include_str!("testdata/fallback_loop_runtime.hex"))
    }
    fn factory() -> Bytes {
        hex(include_str!("testdata/factory.hex"))
    }
    fn factory_runtime() -> Bytes {
        hex(include_str!("testdata/factory_runtime.hex"))
    }
    fn factory_child_runtime() -> Bytes {
        hex(include_str!("testdata/factory_child_runtime.hex"))
    }
    fn suicide() -> Bytes {
        hex(include_str!("testdata/suicide.hex"))
    }
    fn suicide_runtime() -> Bytes {
        hex(include_str!("testdata/suicide_runtime.hex"))
    }

    /// Executions of the test contracts as recorded from a real interpreter.
    fn recorded_scripts() -> Vec<ReplayScript> {
        let create_child = Effect::Create { code: factory_child_runtime(), value: U256::ZERO };

        vec![
            ReplayScript::new(payable(), 69_382).with_output(payable_runtime()),
            ReplayScript::new(payable_runtime(), 21_037),
            ReplayScript::new(constructor_loop(), GAS_LIMIT)
                .with_exception(TransactionException::OutOfGas),
            ReplayScript::new(fallback_loop(), 74_472).with_output(fallback_loop_runtime()),
            ReplayScript::new(fallback_loop_runtime(), GAS_LIMIT)
                .with_exception(TransactionException::OutOfGas),
            ReplayScript::new(suicide(), 131_214)
                .with_output(suicide_runtime())
                .with_effect(Effect::Store { key: B256::ZERO, value: BENEFICIARY.into_word() }),
            ReplayScript::new(suicide_runtime(), 21_040),
            ReplayScript::new(suicide_runtime(), 27_614)
                .with_data(bytes!("41c0e1b5"))
                .with_effect(Effect::SelfDestruct { beneficiary: BENEFICIARY }),
            ReplayScript::new(factory(), 322_817).with_output(factory_runtime()),
            // the first call also initializes the array length
            ReplayScript::new(factory_runtime(), 131_476)
                .with_data(bytes!("3f811b80"))
                .with_effect(create_child.clone()),
            ReplayScript::new(factory_runtime(), 116_476)
                .with_data(bytes!("3f811b80"))
                .with_effect(create_child),
        ]
    }

    struct Fixture {
        state: VmState,
        interpreter: ReplayInterpreter,
        params: ChainParams,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_params(ChainParams::default())
        }

        fn with_params(params: ChainParams) -> Self {
            ledgervm_tracing::init_test_tracing();
            Self {
                state: VmState::new(),
                interpreter: ReplayInterpreter::new(params.clone())
                    .expect("invalid chain parameters")
                    .with_scripts(recorded_scripts()),
                params,
            }
        }

        fn execute(&mut self, batch: &[VmTransaction]) -> ExecutedBatch {
            BatchExecutor::new(self.params.clone(), &mut self.interpreter)
                .expect("invalid chain parameters")
                .execute(&mut self.state, batch)
                .expect("batch execution failed")
        }
    }

    fn hash_at(i: u64) -> B256 {
        B256::from(U256::from_be_bytes(HASHTX.0) + U256::from(i))
    }

    fn create(code: Bytes, gas_limit: u64, hash: B256, output_index: u32) -> VmTransaction {
        VmTransaction::new_create(
            SENDER,
            U256::ZERO,
            U256::from(gas_limit),
            U256::from(1),
            code,
            hash,
            output_index,
        )
    }

    fn call(
        receiver: Address,
        data: Bytes,
        value: u64,
        gas_limit: u64,
        hash: B256,
        output_index: u32,
    ) -> VmTransaction {
        VmTransaction::new_call(
            SENDER,
            receiver,
            U256::from(value),
            U256::from(gas_limit),
            U256::from(1),
            data,
            hash,
            output_index,
        )
    }

    fn assert_settlement(
        executed: &ExecutedBatch,
        gas_used: u64,
        refund: u64,
        refund_outputs: usize,
        transfers: usize,
    ) {
        let settlement = &executed.settlement;
        assert_eq!(settlement.total_gas_used, gas_used);
        assert_eq!(settlement.total_refund, refund);
        assert_eq!(settlement.refund_outputs.len(), refund_outputs);
        assert_eq!(settlement.transfers.len(), transfers);
        for output in &settlement.refund_outputs {
            assert_eq!(output.script, Script::PayToPubKeyHash(SENDER));
        }
    }

    #[test]
    fn test_empty_batch() {
        let mut fixture = Fixture::new();
        let executed = fixture.execute(&[]);

        assert!(executed.is_empty());
        assert_eq!(executed, ExecutedBatch::default());
    }

    #[test]
    fn test_create_contract() {
        let mut fixture = Fixture::new();
        let executed = fixture.execute(&[create(payable(), GAS_LIMIT, HASHTX, 0)]);

        let address = contract_address(&HASHTX, 0);
        let outcome = &executed.results[0].outcome;
        assert_eq!(outcome.exception, TransactionException::None);
        assert_eq!(outcome.new_address, Some(address));
        assert_eq!(outcome.output, payable_runtime());
        assert_eq!(executed.results[0].status, Status::Applied);

        assert_eq!(fixture.state.addresses().len(), 1);
        assert_eq!(fixture.state.balance(&address), U256::ZERO);
        assert_eq!(fixture.state.code(&address), Some(&payable_runtime()));

        assert_settlement(&executed, 69_382, 43, 1, 0);
        assert_eq!(executed.settlement.total_gas_used + executed.settlement.total_refund, 69_425);
        assert_eq!(executed.settlement.refund_outputs[0].value, 43);
    }

    #[test]
    fn test_create_contract_with_value() {
        let mut fixture = Fixture::new();
        let mut tx = create(payable(), GAS_LIMIT, HASHTX, 0);
        tx.value = U256::from(1300);
        let executed = fixture.execute(&[tx.clone()]);

        let address = contract_address(&HASHTX, 0);
        assert_eq!(executed.results[0].outcome.exception, TransactionException::None);
        assert_eq!(executed.results[0].outcome.new_address, Some(address));
        assert_eq!(fixture.state.balance(&address), U256::from(1300));
        assert_eq!(fixture.state.addresses().len(), 1);
        assert_settlement(&executed, 69_382, 43, 1, 1);

        // the endowment moves from the origin output into the contract's custody
        let transfer = &executed.settlement.transfers[0];
        assert_eq!(transfer.inputs, vec![TxIn::spend(tx.origin())]);
        assert_eq!(transfer.outputs, vec![TxOut::new(1300, Script::Custody(address))]);

        let coin = fixture.state.custody(&address).expect("missing custody coin");
        assert_eq!(coin.outpoint, OutPoint::new(transfer.txid(), 0));
        assert_eq!(coin.value, 1300);
    }

    #[test]
    fn test_zero_receiver_creates_contract() {
        let mut fixture = Fixture::new();
        let tx = call(Address::ZERO, payable(), 0, GAS_LIMIT, HASHTX, 0);
        let executed = fixture.execute(&[tx]);

        let address = contract_address(&HASHTX, 0);
        let outcome = &executed.results[0].outcome;
        assert_eq!(outcome.exception, TransactionException::None);
        assert_eq!(outcome.new_address, Some(address));
        assert_eq!(fixture.state.code(&address), Some(&payable_runtime()));
        assert!(!fixture.state.exists(&Address::ZERO));
        assert_settlement(&executed, 69_382, 43, 1, 0);
    }

    #[test]
    fn test_zero_receiver_from_batch_file_creates_contract() {
        let mut fixture = Fixture::new();
        let json = format!(
            r#"{{
                "sender": "0x0101010101010101010101010101010101010101",
                "receiver": "0x0000000000000000000000000000000000000000",
                "gas_limit": "0x7a120",
                "gas_price": "0x1",
                "data": "{}",
                "origin_hash": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"
            }}"#,
            payable(),
        );
        let tx: VmTransaction = serde_json::from_str(&json).unwrap();
        assert!(tx.is_creation());

        let executed = fixture.execute(&[tx]);
        assert_eq!(executed.results[0].outcome.new_address, Some(contract_address(&HASHTX, 0)));
        assert_eq!(fixture.state.addresses().len(), 1);
    }

    #[test]
    fn test_invalid_params_are_rejected() {
        let params = ChainParams { gas_price_divisor: 0, ..Default::default() };

        assert!(matches!(
            BatchExecutor::new(params.clone(), ReplayInterpreter::default()),
            Err(Error::Config(_))
        ));
        assert!(matches!(ReplayInterpreter::new(params), Err(Error::Config(_))));
    }

    #[test]
    fn test_create_contract_out_of_gas_base() {
        let mut fixture = Fixture::new();
        let executed = fixture.execute(&[create(payable(), 100, HASHTX, 0)]);

        let result = &executed.results[0];
        assert_eq!(result.outcome.exception, TransactionException::OutOfGasBase);
        assert_eq!(result.outcome.new_address, None);
        assert!(result.outcome.output.is_empty());
        assert_eq!(result.outcome.gas_used, 100);
        assert_eq!(result.status, Status::RejectedNoState);

        assert!(fixture.state.addresses().is_empty());
        assert_settlement(&executed, 100, 0, 0, 0);
    }

    #[test]
    fn test_create_contract_out_of_gas() {
        let mut fixture = Fixture::new();
        let executed = fixture.execute(&[create(constructor_loop(), GAS_LIMIT, HASHTX, 0)]);

        let result = &executed.results[0];
        assert_eq!(result.outcome.exception, TransactionException::OutOfGas);
        assert_eq!(result.outcome.new_address, None);
        assert_eq!(result.status, Status::Reverted);

        assert!(fixture.state.addresses().is_empty());
        assert_settlement(&executed, GAS_LIMIT, 0, 0, 0);
    }

    #[test]
    fn test_alternating_out_of_gas_base() {
        let mut fixture = Fixture::new();
        let batch = (0..10)
            .map(|i| create(payable(), if i % 2 == 0 { GAS_LIMIT } else { 100 }, hash_at(i), 0))
            .collect::<Vec<_>>();
        let executed = fixture.execute(&batch);

        assert_eq!(executed.len(), 10);
        for (i, outcome) in executed.outcomes().enumerate() {
            if i % 2 == 0 {
                assert_eq!(outcome.exception, TransactionException::None);
                assert_eq!(outcome.new_address, Some(contract_address(&hash_at(i as u64), 0)));
                assert_eq!(outcome.output, payable_runtime());
            } else {
                assert_eq!(outcome.exception, TransactionException::OutOfGasBase);
                assert_eq!(outcome.new_address, None);
                assert!(outcome.output.is_empty());
            }
        }

        assert_eq!(fixture.state.addresses().len(), 5);
        assert_settlement(&executed, 347_410, 215, 5, 0);
    }

    #[test]
    fn test_alternating_out_of_gas() {
        let mut fixture = Fixture::new();
        let batch = (0..10)
            .map(|i| {
                let code = if i % 2 == 0 { payable() } else { constructor_loop() };
                create(code, GAS_LIMIT, hash_at(i), 0)
            })
            .collect::<Vec<_>>();
        let executed = fixture.execute(&batch);

        for (i, outcome) in executed.outcomes().enumerate() {
            let expected = if i % 2 == 0 {
                TransactionException::None
            } else {
                TransactionException::OutOfGas
            };
            assert_eq!(outcome.exception, expected);
        }

        // the successful half landed on distinct addresses
        let addresses = executed.outcomes().filter_map(|o| o.new_address).collect::<Vec<_>>();
        assert_eq!(addresses.len(), 5);
        assert_eq!(fixture.state.addresses().len(), 5);
        assert_settlement(&executed, 2_846_910, 215, 5, 0);
    }

    #[test]
    fn test_create_many_contracts() {
        let mut fixture = Fixture::new();
        let batch =
            (0..130).map(|i| create(payable(), GAS_LIMIT, hash_at(i), i as u32)).collect::<Vec<_>>();
        let executed = fixture.execute(&batch);

        for (i, outcome) in executed.outcomes().enumerate() {
            assert_eq!(outcome.exception, TransactionException::None);
            assert_eq!(outcome.new_address, Some(contract_address(&hash_at(i as u64), i as u32)));
        }

        assert_eq!(fixture.state.addresses().len(), 130);
        assert_settlement(&executed, 9_019_660, 5_590, 130, 0);
    }

    #[test]
    fn test_call_contract_with_value() {
        let mut fixture = Fixture::new();
        fixture.execute(&[create(payable(), GAS_LIMIT, HASHTX, 0)]);
        let contract = contract_address(&HASHTX, 0);

        let tx = call(contract, bytes!("00"), 1300, GAS_LIMIT, HASHTX, 0);
        let executed = fixture.execute(&[tx.clone()]);

        let outcome = &executed.results[0].outcome;
        assert_eq!(outcome.exception, TransactionException::None);
        assert_eq!(outcome.new_address, None);
        assert!(outcome.output.is_empty());

        assert_eq!(fixture.state.addresses().len(), 1);
        assert_eq!(fixture.state.balance(&contract), U256::from(1300));
        assert_settlement(&executed, 21_037, 47, 1, 1);

        // the contract's funds now sit in a custody output
        let transfer = &executed.settlement.transfers[0];
        assert_eq!(transfer.inputs, vec![TxIn::spend(tx.origin())]);
        assert_eq!(transfer.outputs, vec![TxOut::new(1300, Script::Custody(contract))]);
        assert_eq!(fixture.state.custody(&contract).map(|coin| coin.value), Some(1300));
    }

    #[test]
    fn test_call_out_of_gas_base_returns_value() {
        let mut fixture = Fixture::new();
        fixture.execute(&[create(payable(), GAS_LIMIT, HASHTX, 0)]);
        let contract = contract_address(&HASHTX, 0);

        let executed = fixture.execute(&[call(contract, bytes!("00"), 1300, 1, HASHTX, 0)]);

        assert_eq!(executed.results[0].outcome.exception, TransactionException::OutOfGasBase);
        assert_eq!(fixture.state.addresses().len(), 1);
        assert_eq!(fixture.state.balance(&contract), U256::ZERO);
        assert_settlement(&executed, 1, 0, 0, 1);
        assert_eq!(
            executed.settlement.transfers[0].outputs,
            vec![TxOut::new(1300, Script::PayToPubKeyHash(SENDER))]
        );
    }

    #[test]
    fn test_call_out_of_gas_returns_value() {
        let mut fixture = Fixture::new();
        fixture.execute(&[create(fallback_loop(), GAS_LIMIT, HASHTX, 0)]);
        let contract = contract_address(&HASHTX, 0);

        let executed = fixture.execute(&[call(contract, bytes!("00"), 1300, GAS_LIMIT, HASHTX, 0)]);

        assert_eq!(executed.results[0].outcome.exception, TransactionException::OutOfGas);
        assert_eq!(fixture.state.addresses().len(), 1);
        assert_eq!(fixture.state.balance(&contract), U256::ZERO);
        assert!(!fixture.state.exists(&SENDER));
        assert_settlement(&executed, GAS_LIMIT, 0, 0, 1);
    }

    #[test]
    fn test_call_many_contracts_with_value() {
        let mut fixture = Fixture::new();
        let creations =
            (0..130).map(|i| create(payable(), GAS_LIMIT, hash_at(i), i as u32)).collect::<Vec<_>>();
        fixture.execute(&creations);

        let calls = creations
            .iter()
            .enumerate()
            .map(|(i, tx)| call(tx.target(), bytes!("00"), 1300, GAS_LIMIT, hash_at(130), i as u32))
            .collect::<Vec<_>>();
        let executed = fixture.execute(&calls);

        for (outcome, tx) in executed.outcomes().zip(&calls) {
            assert_eq!(outcome.exception, TransactionException::None);
            assert_eq!(fixture.state.balance(&tx.target()), U256::from(1300));
        }
        assert_eq!(fixture.state.addresses().len(), 130);
        assert_settlement(&executed, 2_734_810, 6_110, 130, 130);
    }

    #[test]
    fn test_call_many_out_of_gas_returns_value() {
        let mut fixture = Fixture::new();
        let creations = (0..130)
            .map(|i| create(fallback_loop(), GAS_LIMIT, hash_at(i), i as u32))
            .collect::<Vec<_>>();
        fixture.execute(&creations);

        let calls = creations
            .iter()
            .enumerate()
            .map(|(i, tx)| call(tx.target(), bytes!("00"), 1300, GAS_LIMIT, hash_at(i as u64), i as u32))
            .collect::<Vec<_>>();
        let executed = fixture.execute(&calls);

        for (outcome, tx) in executed.outcomes().zip(&calls) {
            assert_eq!(outcome.exception, TransactionException::OutOfGas);
            assert_eq!(fixture.state.balance(&tx.target()), U256::ZERO);
        }
        assert_eq!(fixture.state.addresses().len(), 130);
        assert_settlement(&executed, GAS_LIMIT * 130, 0, 0, 130);
    }

    #[test]
    fn test_self_destruct() {
        let mut fixture = Fixture::new();

        let mut setup = Vec::new();
        let mut contracts = Vec::new();
        for i in 0..10u64 {
            let code = if i == 0 { payable() } else { suicide() };
            let creation = create(code, GAS_LIMIT, hash_at(i), i as u32);
            let contract = creation.target();
            setup.push(creation);
            if i != 0 {
                setup.push(call(contract, Bytes::new(), 13, GAS_LIMIT, hash_at(i), i as u32));
            }
            contracts.push(contract);
        }
        let executed = fixture.execute(&setup);
        assert!(executed.outcomes().all(|o| o.exception == TransactionException::None));
        for contract in &contracts[1..] {
            assert_eq!(fixture.state.balance(contract), U256::from(13));
            assert_eq!(
                fixture.state.storage_at(contract, &B256::ZERO),
                BENEFICIARY.into_word()
            );
        }

        let kills = contracts[1..]
            .iter()
            .map(|contract| call(*contract, bytes!("41c0e1b5"), 0, GAS_LIMIT, HASHTX, 0))
            .collect::<Vec<_>>();
        let executed = fixture.execute(&kills);

        for (outcome, contract) in executed.outcomes().zip(&contracts[1..]) {
            assert_eq!(outcome.exception, TransactionException::None);
            assert_eq!(fixture.state.balance(contract), U256::ZERO);
            assert!(fixture.state.is_retired(contract));
        }
        assert_eq!(fixture.state.addresses().len(), 1);
        assert_settlement(&executed, 248_526, 423, 9, 9);

        for transfer in &executed.settlement.transfers {
            assert_eq!(transfer.inputs.len(), 1);
            assert_eq!(transfer.outputs, vec![TxOut::new(13, Script::PayToPubKeyHash(BENEFICIARY))]);
        }

        // retired addresses can never be created again
        let again = fixture.execute(&[create(suicide(), GAS_LIMIT, hash_at(1), 1)]);
        assert_eq!(again.results[0].outcome.exception, TransactionException::AddressAlreadyUsed);
        assert_eq!(again.settlement.total_gas_used, GAS_LIMIT);
    }

    #[test]
    fn test_contract_creates_contracts() {
        let mut fixture = Fixture::new();
        let creation = create(factory(), GAS_LIMIT, HASHTX, 0);
        let factory_address = creation.target();
        fixture.execute(&[creation]);

        let calls = (0..20)
            .map(|i| call(factory_address, bytes!("3f811b80"), 0, GAS_LIMIT, HASHTX, i))
            .collect::<Vec<_>>();
        let executed = fixture.execute(&calls);

        assert!(executed.outcomes().all(|o| o.exception == TransactionException::None));
        assert_eq!(fixture.state.addresses().len(), 21);
        assert_settlement(&executed, 2_344_520, 758, 20, 0);

        // nested addresses follow the factory's creation counter
        for nonce in 1..=20 {
            let child = nested_contract_address(&factory_address, nonce);
            assert_eq!(fixture.state.code(&child), Some(&factory_child_runtime()));
        }
        assert_eq!(fixture.state.nonce(&factory_address), 21);
    }

    #[test]
    fn test_address_already_used() {
        let mut fixture = Fixture::new();
        let tx = create(payable(), GAS_LIMIT, HASHTX, 0);
        let executed = fixture.execute(&[tx.clone(), tx]);

        assert_eq!(executed.results[0].status, Status::Applied);
        assert_eq!(executed.results[1].outcome.exception, TransactionException::AddressAlreadyUsed);
        assert_eq!(executed.results[1].status, Status::RejectedNoState);
        assert_eq!(executed.results[1].charge.fee, 50);
        assert_settlement(&executed, 69_382 + GAS_LIMIT, 43, 1, 0);
    }

    #[test]
    fn test_block_gas_limit_reached() {
        let mut fixture =
            Fixture::with_params(ChainParams { block_gas_limit: 600_000, ..Default::default() });
        let batch = (0..3).map(|i| create(payable(), GAS_LIMIT, hash_at(i), 0)).collect::<Vec<_>>();
        let executed = fixture.execute(&batch);

        assert_eq!(executed.results[0].outcome.exception, TransactionException::None);
        assert_eq!(executed.results[1].outcome.exception, TransactionException::None);

        // 138764 gas used leaves no room for another 500000
        let rejected = &executed.results[2];
        assert_eq!(rejected.outcome.exception, TransactionException::BlockGasLimitReached);
        assert_eq!(rejected.charge.gas_used, 0);
        assert_eq!(rejected.charge.fee, 0);
        assert_eq!(rejected.charge.refund, 50);

        assert_eq!(fixture.state.addresses().len(), 2);
        assert_settlement(&executed, 138_764, 136, 3, 0);
    }

    #[test]
    fn test_revert_discards_partial_effects() {
        let mut fixture = Fixture::new();
        fixture.execute(&[create(payable(), GAS_LIMIT, HASHTX, 0)]);
        let contract = contract_address(&HASHTX, 0);
        fixture.interpreter.record(
            ReplayScript::new(payable_runtime(), 30_000)
                .with_data(bytes!("deadbeef"))
                .with_exception(TransactionException::Revert)
                .with_effect(Effect::Store { key: B256::ZERO, value: B256::with_last_byte(7) }),
        );
        let root = fixture.state.state_root();

        let executed = fixture.execute(&[
            call(contract, bytes!("deadbeef"), 0, GAS_LIMIT, HASHTX, 0),
            call(contract, bytes!("00"), 1300, GAS_LIMIT, HASHTX, 1),
        ]);

        let reverted = &executed.results[0];
        assert_eq!(reverted.outcome.exception, TransactionException::Revert);
        assert_eq!(reverted.status, Status::Reverted);
        assert_eq!(reverted.charge.gas_used, 30_000);
        assert_eq!(reverted.charge.refund, 0);
        assert_eq!(fixture.state.storage_at(&contract, &B256::ZERO), B256::ZERO);

        // the failure does not affect the transaction after it
        assert_eq!(executed.results[1].status, Status::Applied);
        assert_eq!(fixture.state.balance(&contract), U256::from(1300));
        assert_ne!(fixture.state.state_root(), root);
    }

    #[test]
    fn test_fee_conservation() {
        let mut fixture = Fixture::new();
        fixture.execute(&[create(fallback_loop(), GAS_LIMIT, HASHTX, 0)]);

        let batch = vec![
            create(payable(), GAS_LIMIT, hash_at(1), 0),
            create(payable(), 100, hash_at(2), 0),
            create(constructor_loop(), GAS_LIMIT, hash_at(3), 0),
            call(contract_address(&HASHTX, 0), bytes!("00"), 1300, GAS_LIMIT, hash_at(4), 0),
            call(contract_address(&hash_at(1), 0), bytes!("00"), 7, 80_000, hash_at(5), 0),
        ];
        let executed = fixture.execute(&batch);
        let accountant = GasAccountant::new(ChainParams::default()).unwrap();

        let mut prepaid_total = 0;
        for (result, tx) in executed.results.iter().zip(&batch) {
            let prepaid = accountant.prepaid(tx).unwrap();
            assert_eq!(result.charge.fee + result.charge.refund, prepaid);
            prepaid_total += prepaid;
        }
        let settlement = &executed.settlement;
        assert_eq!(settlement.total_fee + settlement.total_refund, prepaid_total);
        assert_eq!(
            settlement.total_refund,
            settlement.refund_outputs.iter().map(|output| output.value).sum::<u64>()
        );
    }

    #[test]
    fn test_read_paths_are_idempotent() {
        let mut fixture = Fixture::new();
        fixture.execute(&[create(payable(), GAS_LIMIT, HASHTX, 0)]);

        let first = fixture.state.addresses();
        let second = fixture.state.addresses();
        assert_eq!(first, second);
        assert_eq!(fixture.state.state_root(), fixture.state.state_root());
    }

    /// Runs the replay interpreter but fails on the n-th call.
    struct Faulty {
        inner: ReplayInterpreter,
        fail_at: usize,
        calls: usize,
    }

    impl Interpreter for Faulty {
        fn execute(
            &mut self,
            tx: &VmTransaction,
            target: Address,
            state: &mut VmState,
        ) -> eyre::Result<ExecutionOutcome> {
            self.calls += 1;
            if self.calls == self.fail_at {
                eyre::bail!("interpreter crashed");
            }
            self.inner.execute(tx, target, state)
        }
    }

    #[test]
    fn test_interpreter_failure_reverts_batch() {
        ledgervm_tracing::init_test_tracing();
        let mut state = VmState::new();
        let root = state.state_root();

        let interpreter = Faulty {
            inner: ReplayInterpreter::default().with_scripts(recorded_scripts()),
            fail_at: 3,
            calls: 0,
        };
        let batch = (0..4).map(|i| create(payable(), GAS_LIMIT, hash_at(i), 0)).collect::<Vec<_>>();
        let result = BatchExecutor::new(ChainParams::default(), interpreter)
            .expect("invalid chain parameters")
            .execute(&mut state, &batch);

        assert!(matches!(result, Err(Error::Interpreter(_))));
        assert_eq!(state.state_root(), root);
        assert!(state.addresses().is_empty());
        assert_eq!(state.depth(), 0);
    }

    /// Reports every creation at the wrong address.
    struct Misplacing;

    impl Interpreter for Misplacing {
        fn execute(
            &mut self,
            _tx: &VmTransaction,
            _target: Address,
            _state: &mut VmState,
        ) -> eyre::Result<ExecutionOutcome> {
            Ok(ExecutionOutcome {
                new_address: Some(Address::repeat_byte(0xee)),
                gas_used: 60_000,
                ..Default::default()
            })
        }
    }

    #[test]
    fn test_address_mismatch_is_fatal() {
        let mut state = VmState::new();
        let result = BatchExecutor::new(ChainParams::default(), Misplacing)
            .expect("invalid chain parameters")
            .execute(&mut state, &[create(payable(), GAS_LIMIT, HASHTX, 0)]);

        assert!(matches!(
            result,
            Err(Error::AddressMismatch { reported, .. }) if reported == Address::repeat_byte(0xee)
        ));
        assert_eq!(state.depth(), 0);
    }
}
